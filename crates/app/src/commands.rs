use std::cell::Cell;
use std::io::Read;
use std::path::Path;

use thiserror::Error;
use threadscribe_core::{ConvertContext, PrepareOptions, minify_all, minify_text};
use threadscribe_infra::{dispatch_json, prepare_json};
use tracing::{info, warn};

use crate::cli::Command;
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn read_input(path: &Path) -> Result<String, CommandError> {
    let result = if path.as_os_str() == "-" {
        let mut raw = String::new();
        std::io::stdin().read_to_string(&mut raw).map(|_| raw)
    } else {
        std::fs::read_to_string(path)
    };
    result.map_err(|source| CommandError::Read {
        path: path.display().to_string(),
        source,
    })
}

/// Runs `command` over the raw payload and returns what should go to stdout.
pub fn execute(command: &Command, raw: &str, config: &AppConfig) -> Result<String, CommandError> {
    let hint = command.input().source.as_deref().unwrap_or(&config.source);
    let diagnostics = Cell::new(0usize);
    let sink = |_: &str| diagnostics.set(diagnostics.get() + 1);

    let output = match command {
        Command::Prepare {
            max_comments, slim, ..
        } => {
            let options = PrepareOptions {
                max_comments: max_comments.unwrap_or(config.max_comments),
                slim: *slim || config.slim,
            };
            let ctx = ConvertContext::new(config.for_analysis).with_sink(&sink);
            let prepared = prepare_json(raw, hint, options, &ctx);
            info!(
                source = hint,
                included = prepared.included,
                total = prepared.total,
                truncated = prepared.truncated,
                "prepared comments"
            );
            prepared.text
        }
        Command::Convert { for_analysis, .. } => {
            let ctx = ConvertContext::new(*for_analysis || config.for_analysis).with_sink(&sink);
            let threads = dispatch_json(raw, hint, &ctx);
            info!(source = hint, threads = threads.len(), "converted payload");
            with_newline(serde_json::to_string_pretty(&threads)?)
        }
        Command::Minify { json, .. } => {
            let ctx = ConvertContext::new(true).with_sink(&sink);
            let minified = minify_all(&dispatch_json(raw, hint, &ctx));
            info!(source = hint, threads = minified.len(), "minified payload");
            if *json {
                with_newline(serde_json::to_string_pretty(&minified)?)
            } else {
                minify_text(&minified)
            }
        }
    };

    if diagnostics.get() > 0 {
        warn!(
            command = command.name(),
            count = diagnostics.get(),
            "conversion reported diagnostics; rerun with RUST_LOG=threadscribe=debug for details"
        );
    }
    Ok(output)
}

fn with_newline(mut text: String) -> String {
    text.push('\n');
    text
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use serde_json::{Value, json};

    use super::*;
    use crate::cli::InputArgs;

    fn config() -> AppConfig {
        AppConfig {
            max_comments: 200,
            slim: false,
            for_analysis: false,
            source: "auto".to_string(),
        }
    }

    fn input(source: Option<&str>) -> InputArgs {
        InputArgs {
            source: source.map(str::to_string),
            input: PathBuf::from("-"),
        }
    }

    fn story() -> String {
        json!([
            { "id": 1, "type": "story", "title": "T", "by": "alice", "kids": [2], "score": 5 },
            { "id": 2, "type": "comment", "by": "bob", "text": "hi" }
        ])
        .to_string()
    }

    #[test]
    fn prepare_uses_config_defaults_and_flags() {
        let command = Command::Prepare {
            input: input(None),
            max_comments: None,
            slim: true,
        };
        let output = execute(&command, &story(), &config()).unwrap();
        assert_eq!(output, "# T\n\n## Comments\n\n**bob**:\nhi\n");

        let command = Command::Prepare {
            input: input(Some("hackernews")),
            max_comments: Some(0),
            slim: false,
        };
        let output = execute(&command, &story(), &config()).unwrap();
        assert_eq!(output, "_Note: analysis truncated to the first 0 of 1 comments._\n");
    }

    #[test]
    fn convert_honours_for_analysis() {
        let command = Command::Convert {
            input: input(None),
            for_analysis: false,
        };
        let output: Value = serde_json::from_str(&execute(&command, &story(), &config()).unwrap()).unwrap();
        assert_eq!(output[0]["sourceType"], json!("HackerNews"));
        assert_eq!(output[0]["metadata"]["score"], json!(5));

        let command = Command::Convert {
            input: input(None),
            for_analysis: true,
        };
        let output: Value = serde_json::from_str(&execute(&command, &story(), &config()).unwrap()).unwrap();
        assert!(output[0].get("metadata").is_none());
    }

    #[test]
    fn minify_json_drops_ids() {
        let command = Command::Minify {
            input: input(None),
            json: true,
        };
        let output: Value = serde_json::from_str(&execute(&command, &story(), &config()).unwrap()).unwrap();
        assert_eq!(output[0]["title"], json!("T"));
        assert!(output[0].get("id").is_none());
        assert_eq!(output[0]["comments"][0]["author"], json!("bob"));
    }

    #[test]
    fn unrecognized_input_prepares_verbatim() {
        let command = Command::Prepare {
            input: input(Some("reddit")),
            max_comments: None,
            slim: false,
        };
        let output = execute(&command, "plain text", &config()).unwrap();
        assert_eq!(output, "plain text");
    }

    #[test]
    fn missing_file_reports_path() {
        let err = read_input(Path::new("/nonexistent/threadscribe.json")).unwrap_err();
        assert!(err.to_string().starts_with("failed to read /nonexistent/threadscribe.json"));
    }
}
