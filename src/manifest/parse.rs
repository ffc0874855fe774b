use crate::error::LoadError;
use crate::manifest::document::Document;
use crate::manifest::strict;
use std::fs;
use std::path::Path;
use tracing::debug;

/// Documents read from one source file, in in-file order.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedFile {
    pub file: String,
    pub documents: Vec<Document>,
}

/// Load `files` (relative to `dir`) in declaration order.
///
/// Each file may hold any number of `---`-separated YAML documents. Null
/// documents (stray or trailing separators, comment-only documents) are
/// dropped. Any unreadable file or malformed document fails the whole load.
pub fn load_documents(dir: &Path, files: &[String]) -> Result<Vec<LoadedFile>, LoadError> {
    let mut out = Vec::with_capacity(files.len());
    for file in files {
        let documents = parse_file(&dir.join(file), file)?;
        debug!(file = %file, documents = documents.len(), "loaded manifest file");
        out.push(LoadedFile {
            file: file.clone(),
            documents,
        });
    }
    Ok(out)
}

/// Concatenate documents in file-then-document order.
pub fn flatten(files: Vec<LoadedFile>) -> Vec<Document> {
    files.into_iter().flat_map(|f| f.documents).collect()
}

fn parse_file(path: &Path, source_name: &str) -> Result<Vec<Document>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_documents(path, source_name, &text)
}

/// Parse every document in `text`. `path` and `source_name` only label errors.
pub(crate) fn parse_documents(
    path: &Path,
    source_name: &str,
    text: &str,
) -> Result<Vec<Document>, LoadError> {
    let mut out = Vec::new();
    for (index, de) in serde_yaml::Deserializer::from_str(text).enumerate() {
        let value = strict::to_json(de)
            .map_err(|source| LoadError::Parse {
                path: path.to_path_buf(),
                source,
            })?
            .map_err(|reason| LoadError::Malformed {
                source_name: source_name.to_string(),
                index,
                reason,
            })?;

        if value.is_null() {
            continue;
        }

        out.push(Document::from_value(source_name, index, value)?);
    }
    Ok(out)
}
