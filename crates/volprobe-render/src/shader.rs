//! Shader management.
//!
//! Every pass shares the parameter block declarations and sampling helpers in
//! `common.wgsl`; the builder prepends them to the pass source.

use crate::error::{RenderError, RenderResult};

/// Parameter blocks, volume sampling and colormap lookup shared by all passes.
pub const COMMON_WGSL: &str = include_str!("shaders/common.wgsl");

/// Builder for creating shader modules from composed WGSL sources.
pub struct ShaderBuilder {
    sources: Vec<String>,
    label: Option<String>,
}

impl ShaderBuilder {
    /// Creates a builder that starts with the shared declarations.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: vec![COMMON_WGSL.to_string()],
            label: None,
        }
    }

    /// Creates a builder with no shared prelude.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            sources: Vec::new(),
            label: None,
        }
    }

    /// Appends a WGSL source.
    #[must_use]
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    /// Sets the shader label for debugging.
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Builds the shader module.
    pub fn build_module(self, device: &wgpu::Device) -> RenderResult<wgpu::ShaderModule> {
        let source = self.combined_source()?;

        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: self.label.as_deref(),
            source: wgpu::ShaderSource::Wgsl(source.into()),
        });

        Ok(module)
    }

    fn combined_source(&self) -> RenderResult<String> {
        if self.sources.iter().all(|s| s.trim().is_empty()) {
            return Err(RenderError::ShaderCompilationFailed(format!(
                "no shader source for {}",
                self.label.as_deref().unwrap_or("unlabeled shader")
            )));
        }
        Ok(self.sources.join("\n\n"))
    }
}

impl Default for ShaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
