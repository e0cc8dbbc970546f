//! Put files on a micro:bit's filesystem over USB serial.
//!
//! The board's MicroPython exposes a "raw REPL": after `Ctrl-A` it reads a
//! block of code up to `Ctrl-D`, answers `OK`, runs it and sends back its
//! output and error text, each terminated by `Ctrl-D`. Uploading a file is
//! then just running a short script that writes the bytes out in chunks.

pub mod error;
pub mod repl;
pub mod save;

pub use error::LoadError;
pub use repl::{Port, RawRepl};
pub use save::make_save_script;

/// Save `contents` on the board as `name`.
pub fn upload<P: Port>(
    repl: &mut RawRepl<P>,
    contents: &[u8],
    name: &str,
    on_output: impl FnMut(&[u8]),
) -> Result<(), LoadError> {
    run_script(repl, &make_save_script(contents, name), on_output)
}

/// Run every statement of `script`, stopping at the first one that reports
/// an error. Whatever a statement prints is handed to `on_output`.
///
/// The raw REPL is always left again, even when a statement failed.
pub fn run_script<P: Port>(
    repl: &mut RawRepl<P>,
    script: &[String],
    mut on_output: impl FnMut(&[u8]),
) -> Result<(), LoadError> {
    repl.enter()?;

    let mut result = Ok(());
    for statement in script {
        match repl.exec(statement) {
            Ok((output, error)) => {
                on_output(&output);
                if !error.is_empty() {
                    result = Err(LoadError::Remote(
                        String::from_utf8_lossy(&error).into_owned(),
                    ));
                    break;
                }
            }
            Err(e) => {
                result = Err(e);
                break;
            }
        }
    }

    repl.exit()?;
    result
}
