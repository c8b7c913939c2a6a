use crate::error::EngineError;

/// Reads a WGSL source file and hands it to the device. A missing or
/// unreadable file is an initialization error naming the path; shader
/// compilation problems surface through wgpu's own validation.
pub fn load_module(device: &wgpu::Device, path: &str) -> Result<wgpu::ShaderModule, EngineError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| EngineError::Init(format!("failed to open shader file {path}: {e}")))?;
    Ok(device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some("Cell Shader"),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    }))
}
