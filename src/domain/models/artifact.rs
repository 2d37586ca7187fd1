//! Candidate artifact domain model.
//!
//! A candidate artifact is one generated version of the Chisel source being
//! repaired. It is extracted from a raw completion response, normalized into
//! a "stripped" body (no imports, package clause or `App` entry object), and
//! re-decorated with the boilerplate the structural compiler needs.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

const FENCE_OPEN: &str = "```scala";
const FENCE_CLOSE: &str = "```";

static IMPORT_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*import\b.*(?:\n|$)").expect("valid import regex"));
static PACKAGE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*package\b.*(?:\n|$)").expect("valid package regex"));
static APP_OBJECT_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"object\s+\w+\s+extends\s+App\s*\{").expect("valid app object regex")
});

/// One generated version of the hardware source.
///
/// Immutable once produced; a repair always yields a new artifact so the
/// lineage of attempts stays intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateArtifact {
    /// Raw completion text the artifact was extracted from.
    response: String,
    /// Concatenated contents of every fenced region.
    code: String,
    /// Code with imports, package clause and `App` object removed.
    stripped: String,
    /// Name of the top-level module the artifact must expose.
    top_module: String,
}

impl CandidateArtifact {
    /// Extract an artifact from a completion response.
    ///
    /// Fails with [`DomainError::ParseError`] when the response contains no
    /// fenced Scala region or a region is never closed.
    pub fn from_response(
        response: impl Into<String>,
        top_module: impl Into<String>,
    ) -> DomainResult<Self> {
        let response = response.into();
        let code = extract_fenced(&response)?;
        let stripped = strip(&code);

        Ok(Self {
            response,
            code,
            stripped,
            top_module: top_module.into(),
        })
    }

    /// The raw completion response.
    pub fn response(&self) -> &str {
        &self.response
    }

    /// The extracted code, exactly as it appeared inside the fences.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The normalized body used in prompts and history.
    pub fn stripped(&self) -> &str {
        &self.stripped
    }

    pub fn top_module(&self) -> &str {
        &self.top_module
    }

    /// The compilable source: package clause, imports, body and an entry
    /// object that emits Verilog into `generated/`.
    pub fn decorated(&self) -> String {
        decorate(&self.stripped, &self.top_module)
    }
}

/// Collect every fenced Scala region, joined by newlines.
pub fn extract_fenced(response: &str) -> DomainResult<String> {
    let mut blocks = Vec::new();
    let mut cursor = 0;

    while let Some(offset) = response[cursor..].find(FENCE_OPEN) {
        let start = cursor + offset + FENCE_OPEN.len();
        let Some(len) = response[start..].find(FENCE_CLOSE) else {
            return Err(DomainError::ParseError(
                "Scala code block is not closed".to_string(),
            ));
        };
        blocks.push(&response[start..start + len]);
        cursor = start + len + FENCE_CLOSE.len();
    }

    if blocks.is_empty() {
        return Err(DomainError::ParseError(
            "Scala code block is not found".to_string(),
        ));
    }

    Ok(blocks.join("\n"))
}

/// Remove imports, package clauses and any `object _ extends App { .. }`.
///
/// Applied until nothing more is removed, so stripping an already stripped
/// body is a no-op.
pub fn strip(code: &str) -> String {
    let mut current = code.to_string();
    loop {
        let next = strip_once(&current);
        if next == current {
            return next.trim().to_string();
        }
        current = next;
    }
}

fn strip_once(code: &str) -> String {
    let code = IMPORT_LINE.replace_all(code, "");
    let code = PACKAGE_LINE.replace_all(&code, "");
    remove_app_objects(&code)
}

/// Cut every `App` entry object, matching braces so that only the object's
/// own body goes. An unclosed object runs to the end of the code.
fn remove_app_objects(code: &str) -> String {
    let mut kept = String::with_capacity(code.len());
    let mut rest = code;

    while let Some(head) = APP_OBJECT_HEAD.find(rest) {
        kept.push_str(&rest[..head.start()]);
        let body = &rest[head.end()..];

        let mut depth = 1usize;
        let mut end = body.len();
        for (i, c) in body.char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        end = i + 1;
                        break;
                    }
                }
                _ => {}
            }
        }
        rest = &body[end..];
    }

    kept.push_str(rest);
    kept
}

/// Wrap a stripped body with the boilerplate the structural compiler needs.
pub fn decorate(stripped: &str, top_module: &str) -> String {
    format!(
        "package {top_module}\n\n\
         import chisel3._\n\
         import chisel3.util._\n\n\
         import chisel3.stage.ChiselStage\n\n\
         {stripped}\n\n\
         object Main extends App {{\n\
         \x20   (new ChiselStage).emitVerilog(\n\
         \x20     new {top_module},\n\
         \x20     Array(\n\
         \x20       \"--target-dir\", \"generated\",\n\
         \x20       \"--emission-options=disableMemRandomization,disableRegisterRandomization\",\n\
         \x20     )\n\
         \x20   )\n\
         }}\n"
    )
}
