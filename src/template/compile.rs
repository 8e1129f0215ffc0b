use mrml::prelude::render::RenderOptions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("MJML parse failed: {0}")]
    Parse(String),

    #[error("MJML render failed: {0}")]
    Render(String),
}

/// Compile composed MJML markup to final HTML. The compiler is treated as a
/// black box: diagnostics are surfaced as the per-file failure, nothing more.
pub fn compile(markup: &str) -> Result<String, CompileError> {
    let root = mrml::parse(markup).map_err(|err| CompileError::Parse(err.to_string()))?;
    root.render(&RenderOptions::default())
        .map_err(|err| CompileError::Render(err.to_string()))
}
