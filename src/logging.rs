//! Logger setup for the `microserve` binary.
//!
//! Everything logs through the `log` facade. Lines always go to the console
//! and, when `use_text_log` is set, are also appended to `log_location`.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};

use env_logger::{Builder, Env, Target, WriteStyle};

use crate::server::{Error, ServerConfig};

/// Copies every log line to stdout and to the log file.
struct Tee {
    file: File,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // The console may be gone after daemonizing; the file is what counts.
        let _ = io::stdout().write_all(buf);
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        let _ = io::stdout().flush();
        self.file.flush()
    }
}

/// Install the global logger at `info` level. `RUST_LOG` overrides the level.
pub fn init(config: &ServerConfig) -> Result<(), Error> {
    let mut builder = Builder::from_env(Env::default().default_filter_or("info"));

    if config.use_text_log {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.log_location)?;
        builder
            .target(Target::Pipe(Box::new(Tee { file })))
            .write_style(WriteStyle::Never);
    } else {
        builder.target(Target::Stdout);
    }

    builder.try_init()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_tee_appends_to_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("microserve.log");
        fs::write(&path, "earlier\n").unwrap();

        let file = OpenOptions::new().append(true).open(&path).unwrap();
        let mut tee = Tee { file };
        tee.write_all(b"INFO Listening on 127.0.0.1:8080\n").unwrap();
        tee.flush().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "earlier\nINFO Listening on 127.0.0.1:8080\n"
        );
    }
}
