use std::io::Write;
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::error::CodecError;

/// Run `program args...`, feeding `input` on stdin and collecting stdout.
///
/// stdin is written from a scoped thread so a tool that starts emitting
/// output before consuming all input cannot deadlock on a full pipe.
pub fn pipe_through(program: &str, args: &[String], input: &[u8]) -> Result<Vec<u8>, CodecError> {
    debug!(program, ?args, input_len = input.len(), "running external encoder");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| CodecError::ToolSpawn {
            program: program.to_string(),
            source,
        })?;

    let mut stdin = child.stdin.take().ok_or_else(|| CodecError::ToolSpawn {
        program: program.to_string(),
        source: std::io::Error::other("stdin not captured"),
    })?;

    let (output, write_result) = thread::scope(|s| {
        // Dropping stdin at the end of the closure closes the pipe
        let writer = s.spawn(move || stdin.write_all(input));
        let output = child.wait_with_output();
        let write_result = writer
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
        (output, write_result)
    });

    let output = output.map_err(|source| CodecError::ToolSpawn {
        program: program.to_string(),
        source,
    })?;

    if !output.status.success() {
        return Err(CodecError::ToolFailed {
            program: program.to_string(),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    // A broken pipe only matters if the tool did not succeed anyway
    if let Err(e) = write_result {
        if e.kind() != std::io::ErrorKind::BrokenPipe {
            return Err(CodecError::ToolSpawn {
                program: program.to_string(),
                source: e,
            });
        }
    }
    if output.stdout.is_empty() {
        return Err(CodecError::Encode(format!("{} produced no output", program)));
    }

    Ok(output.stdout)
}
