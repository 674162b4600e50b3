use anyhow::Result;
use layer_models::{BuildRequest, LayerMetadata};
use std::io::Read;

/// Request fixture with sensible test values.
pub fn build_request(package_name: &str, dependencies: &[&str]) -> BuildRequest {
    BuildRequest {
        package_name: package_name.to_string(),
        dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
        ..BuildRequest::default()
    }
}

/// Member names of a zip archive held in memory.
pub fn zip_member_names(data: &[u8]) -> Result<Vec<String>> {
    let archive = zip::ZipArchive::new(std::io::Cursor::new(data))?;
    Ok(archive.file_names().map(|n| n.to_string()).collect())
}

/// Content of one member of a zip archive held in memory.
pub fn zip_member_content(data: &[u8], name: &str) -> Result<String> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(data))?;
    let mut member = archive.by_name(name)?;
    let mut content = String::new();
    member.read_to_string(&mut content)?;
    Ok(content)
}

/// Parse a stored metadata record.
pub fn parse_metadata(data: &[u8]) -> Result<LayerMetadata> {
    Ok(serde_json::from_slice(data)?)
}
