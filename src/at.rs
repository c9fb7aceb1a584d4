//! AT-command encoding for the Bluefruit LE UART module.
//!
//! Every command is ASCII text followed by a single carriage return.
//! Keyboard reports travel as `AT+BLEKEYBOARDCODE=` followed by one
//! lowercase hex pair per report byte, pairs joined with `-`:
//!
//! ```text
//! [0x02, 0x00, 0x04]  ->  AT+BLEKEYBOARDCODE=02-00-04\r
//! ```

use core::ops::Range;

use heapless::Vec;

use crate::config::{AT_KEYBOARD_CODE, AT_TERMINATOR, MAX_COMMAND_LEN};
use crate::error::{Error, Result};

/// One encoded command, terminator included.
pub type Command = Vec<u8, MAX_COMMAND_LEN>;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// `text` followed by the terminator.
pub fn encode_command(text: &str) -> Result<Command> {
    let mut cmd = Command::new();
    push_all(&mut cmd, text.as_bytes())?;
    push(&mut cmd, AT_TERMINATOR)?;
    Ok(cmd)
}

/// Keyboard command carrying `raw[keys]` as hyphen-separated hex pairs.
///
/// An empty range yields the bare prefix and terminator.
pub fn encode_report(raw: &[u8], keys: Range<usize>) -> Result<Command> {
    if keys.start > keys.end || keys.end > raw.len() {
        return Err(Error::InvalidKeyRange);
    }

    let mut cmd = Command::new();
    push_all(&mut cmd, AT_KEYBOARD_CODE.as_bytes())?;
    for (n, &byte) in raw[keys].iter().enumerate() {
        if n > 0 {
            push(&mut cmd, b'-')?;
        }
        push(&mut cmd, HEX[usize::from(byte >> 4)])?;
        push(&mut cmd, HEX[usize::from(byte & 0x0f)])?;
    }
    push(&mut cmd, AT_TERMINATOR)?;
    Ok(cmd)
}

fn push(cmd: &mut Command, byte: u8) -> Result<()> {
    cmd.push(byte).map_err(|_| Error::CommandTooLong)
}

fn push_all(cmd: &mut Command, bytes: &[u8]) -> Result<()> {
    cmd.extend_from_slice(bytes)
        .map_err(|_| Error::CommandTooLong)
}
