// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Defines the hierarchy of error types for the rendering subsystem.

use crate::renderer::api::{BufferId, RenderPipelineId};
use std::fmt;

/// An error related to the creation or management of a GPU resource.
#[derive(Debug)]
pub enum ResourceError {
    /// The backend failed to create a resource.
    CreationFailed {
        /// The kind of resource being created (e.g., "buffer", "sampler").
        resource_kind: &'static str,
        /// A descriptive label for the resource, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// An operation referenced a resource handle the backend does not know.
    InvalidHandle {
        /// The kind of resource the handle was supposed to identify.
        resource_kind: &'static str,
    },
    /// A write into a buffer failed or was out of bounds.
    BufferWriteFailed {
        /// The buffer being written.
        buffer: BufferId,
        /// The offset of the failed write.
        offset: u64,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// The backend ran out of memory for the requested allocation.
    OutOfMemory {
        /// The size of the failed allocation, in bytes.
        size: u64,
    },
}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceError::CreationFailed {
                resource_kind,
                label,
                details,
            } => match label {
                Some(label) => {
                    write!(f, "Failed to create {resource_kind} '{label}': {details}")
                }
                None => write!(f, "Failed to create {resource_kind}: {details}"),
            },
            ResourceError::InvalidHandle { resource_kind } => {
                write!(f, "Invalid {resource_kind} handle")
            }
            ResourceError::BufferWriteFailed {
                buffer,
                offset,
                details,
            } => {
                write!(
                    f,
                    "Failed to write buffer {buffer:?} at offset {offset}: {details}"
                )
            }
            ResourceError::OutOfMemory { size } => {
                write!(f, "Backend out of memory allocating {size} bytes")
            }
        }
    }
}

impl std::error::Error for ResourceError {}

/// An error related to the creation or management of a graphics pipeline.
#[derive(Debug)]
pub enum PipelineError {
    /// The graphics backend failed to compile the full pipeline state object.
    CompilationFailed {
        /// A descriptive label for the pipeline, if available.
        label: Option<String>,
        /// Detailed error messages from the backend.
        details: String,
    },
    /// A shader referenced by the pipeline failed to compile.
    ShaderCompilationFailed {
        /// The shader source name.
        source: String,
        /// Detailed error messages from the shader compiler.
        details: String,
    },
    /// The specified render pipeline ID is not valid.
    InvalidRenderPipeline {
        /// The ID of the invalid render pipeline.
        id: RenderPipelineId,
    },
    /// The color target format is not compatible with the pipeline or device.
    IncompatibleColorTarget(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::CompilationFailed { label, details } => match label {
                Some(label) => write!(f, "Pipeline compilation failed for '{label}': {details}"),
                None => write!(f, "Pipeline compilation failed: {details}"),
            },
            PipelineError::ShaderCompilationFailed { source, details } => {
                write!(f, "Shader compilation failed for '{source}': {details}")
            }
            PipelineError::InvalidRenderPipeline { id } => {
                write!(f, "Invalid render pipeline ID: {id:?}")
            }
            PipelineError::IncompatibleColorTarget(details) => {
                write!(f, "Incompatible color target: {details}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_error_display_includes_label() {
        let err = ResourceError::CreationFailed {
            resource_kind: "sampler",
            label: Some("content-sampler".to_string()),
            details: "backend rejected descriptor".to_string(),
        };
        let message = err.to_string();
        assert!(message.contains("sampler"));
        assert!(message.contains("content-sampler"));
    }

    #[test]
    fn test_pipeline_error_display_without_label() {
        let err = PipelineError::CompilationFailed {
            label: None,
            details: "bad define".to_string(),
        };
        assert!(err.to_string().contains("bad define"));
    }
}
