//! # External Tool Execution Module
//!
//! Runner buffer-in/buffer-out per gli encoder esterni.
//!
//! ## Responsabilità:
//! - Materializza il buffer di input in una directory temporanea
//! - Sostituisce i token `{input}`/`{output}` negli argomenti del tool
//! - Esegue il processo con `tokio::process::Command` e cattura stderr
//! - Rilegge il file prodotto (o il file di input per i tool in-place)
//!
//! La directory temporanea viene rimossa alla fine del task in ogni caso.

use std::process::Stdio;

use crate::error::TaskError;

/// Placeholder replaced with the temp input file path.
pub const INPUT_TOKEN: &str = "{input}";
/// Placeholder replaced with the temp output file path.
pub const OUTPUT_TOKEN: &str = "{output}";

/// Runs an external tool over an in-memory buffer and returns the produced
/// bytes.
///
/// `input_ext`/`output_ext` name the temp files, since several encoders
/// select their decoder by extension. Tools whose argument list carries no
/// `{output}` token are treated as in-place: the (copied) input file is read
/// back after the run.
pub async fn exec_buffer(
    tool: &'static str,
    args: &[String],
    input: &[u8],
    input_ext: &str,
    output_ext: &str,
) -> Result<Vec<u8>, TaskError> {
    let workdir = tempfile::tempdir()?;
    let input_path = workdir.path().join(format!("input.{input_ext}"));
    let output_path = workdir.path().join(format!("output.{output_ext}"));

    tokio::fs::write(&input_path, input).await?;

    let input_str = input_path.to_string_lossy();
    let output_str = output_path.to_string_lossy();
    let in_place = !args.iter().any(|arg| arg.contains(OUTPUT_TOKEN));

    let resolved: Vec<String> = args
        .iter()
        .map(|arg| {
            arg.replace(INPUT_TOKEN, &input_str)
                .replace(OUTPUT_TOKEN, &output_str)
        })
        .collect();

    let output = tokio::process::Command::new(tool)
        .args(&resolved)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => TaskError::ToolUnavailable { tool, source },
            _ => TaskError::Io(source),
        })?;

    if !output.status.success() {
        return Err(TaskError::from_tool_failure(tool, output.status, &output.stderr));
    }

    let result_path = if in_place { &input_path } else { &output_path };
    let buffer = tokio::fs::read(result_path).await?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_round_trips_buffer_through_tool() {
        // `cp` stands in for an encoder: output bytes == input bytes.
        let args = vec![INPUT_TOKEN.to_string(), OUTPUT_TOKEN.to_string()];
        let result = exec_buffer("cp", &args, b"payload", "bin", "bin").await.unwrap();
        assert_eq!(result, b"payload");
    }

    #[tokio::test]
    async fn test_in_place_tool_reads_input_back() {
        // `true` touches nothing: the copied input is returned unchanged.
        let args: Vec<String> = vec![];
        let result = exec_buffer("true", &args, b"payload", "bin", "bin").await.unwrap();
        assert_eq!(result, b"payload");
    }

    #[tokio::test]
    async fn test_missing_tool_maps_to_unavailable() {
        let args = vec![INPUT_TOKEN.to_string()];
        let error = exec_buffer("definitely-not-a-real-encoder", &args, b"x", "bin", "bin")
            .await
            .unwrap_err();
        assert!(matches!(error, TaskError::ToolUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_silent_failure_has_no_display_message() {
        let args: Vec<String> = vec![];
        let error = exec_buffer("false", &args, b"x", "bin", "bin").await.unwrap_err();
        assert!(matches!(error, TaskError::EncoderSilent { .. }));
        assert!(error.display_message().is_none());
    }
}
