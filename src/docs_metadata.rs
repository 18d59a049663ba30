//! Writes the lattice docs into the website tree with the metadata from
//! `docs/docs-metadata.json` prepended as front-matter.

use serde_json::{Map, Value};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::{Component, Path, PathBuf},
};

pub const METADATA_FILE: &str = "docs-metadata.json";

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("invalid JSON")]
    Json(#[from] serde_json::Error),
    #[error("expected a JSON object mapping document file names to metadata")]
    NotAnObject,
    #[error("metadata for document '{0}' is not a JSON object")]
    DocumentNotAnObject(String),
    #[error("value of '{key}' for document '{document}' is not a string, number, boolean or null")]
    UnsupportedValue { document: String, key: String },
}

#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("failed to read '{}'", .0.display())]
    Read(PathBuf, #[source] std::io::Error),
    #[error("failed to write '{}'", .0.display())]
    Write(PathBuf, #[source] std::io::Error),
    #[error("failed to load '{}'", .0.display())]
    InvalidMetadata(PathBuf, #[source] MetadataError),
    #[error("invalid document file name '{0}'")]
    InvalidFilename(String),
}

/// Front-matter fields of one document, in the order they appear in the JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub filename: String,
    pub fields: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocMetadata(pub Vec<Document>);

impl DocMetadata {
    pub fn from_json(json: &str) -> Result<DocMetadata, MetadataError> {
        let root: Value = serde_json::from_str(json)?;
        let documents = match root {
            Value::Object(documents) => documents,
            _ => return Err(MetadataError::NotAnObject),
        };
        documents
            .into_iter()
            .map(|(filename, fields)| match fields {
                Value::Object(fields) => {
                    let fields = front_matter_fields(&filename, fields)?;
                    Ok(Document { filename, fields })
                }
                _ => Err(MetadataError::DocumentNotAnObject(filename)),
            })
            .collect::<Result<Vec<_>, _>>()
            .map(DocMetadata)
    }

    pub fn load(path: &Path) -> Result<DocMetadata, MergeError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| MergeError::Read(path.to_owned(), e))?;
        DocMetadata::from_json(&json).map_err(|e| MergeError::InvalidMetadata(path.to_owned(), e))
    }
}

fn front_matter_fields(
    document: &str,
    fields: Map<String, Value>,
) -> Result<Vec<(String, String)>, MetadataError> {
    fields
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s,
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                Value::Null => String::new(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(MetadataError::UnsupportedValue {
                        document: document.to_owned(),
                        key,
                    })
                }
            };
            Ok((key, value))
        })
        .collect()
}

pub fn render_front_matter(fields: &[(String, String)]) -> String {
    let mut front_matter = String::from("---\n");
    for (key, value) in fields {
        front_matter.push_str(&format!("{}: {}\n", key, value));
    }
    front_matter.push_str("---\n\n");
    front_matter
}

// only plain relative paths, so documents can't end up outside the docs directories
fn document_path(filename: &str) -> Result<&Path, MergeError> {
    let path = Path::new(filename);
    let plain = path.components().count() > 0
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(path)
    } else {
        Err(MergeError::InvalidFilename(filename.to_owned()))
    }
}

pub fn source_docs_dir(lattice_path: &Path) -> PathBuf {
    lattice_path.join("docs")
}

pub fn website_docs_dir(website_path: &Path) -> PathBuf {
    website_path.join("middleman").join("source").join("docs")
}

fn write_document(dest: &Path, front_matter: &str, body: &[u8]) -> Result<(), MergeError> {
    let write_err = |e| MergeError::Write(dest.to_owned(), e);
    if let Some(parent) = dest.parent() {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    let mut out = BufWriter::new(File::create(dest).map_err(write_err)?);
    out.write_all(front_matter.as_bytes()).map_err(write_err)?;
    out.write_all(body).map_err(write_err)?;
    out.flush().map_err(write_err)?;
    Ok(())
}

/// Merges every document listed in the metadata file and returns how many were
/// written. Stops at the first error; documents written before it stay.
pub fn merge_docs(lattice_path: &Path, website_path: &Path) -> Result<usize, MergeError> {
    let source_dir = source_docs_dir(lattice_path);
    let dest_dir = website_docs_dir(website_path);
    let metadata = DocMetadata::load(&source_dir.join(METADATA_FILE))?;

    for doc in &metadata.0 {
        let relative = document_path(&doc.filename)?;
        let source = source_dir.join(relative);
        let dest = dest_dir.join(relative);
        let body = std::fs::read(&source).map_err(|e| MergeError::Read(source.clone(), e))?;
        write_document(&dest, &render_front_matter(&doc.fields), &body)?;
        tracing::info!("wrote {}", dest.display());
    }

    Ok(metadata.0.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    struct Checkouts {
        lattice: tempfile::TempDir,
        website: tempfile::TempDir,
    }

    impl Checkouts {
        fn new() -> Self {
            let checkouts = Checkouts {
                lattice: tempfile::TempDir::new().unwrap(),
                website: tempfile::TempDir::new().unwrap(),
            };
            std::fs::create_dir_all(source_docs_dir(checkouts.lattice.path())).unwrap();
            checkouts
        }

        fn with_doc(self, name: &str, contents: &str) -> Self {
            let path = source_docs_dir(self.lattice.path()).join(name);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
            self
        }

        fn with_metadata(self, json: &str) -> Self {
            self.with_doc(METADATA_FILE, json)
        }

        fn merge(&self) -> Result<usize, MergeError> {
            merge_docs(self.lattice.path(), self.website.path())
        }

        fn output(&self, name: &str) -> PathBuf {
            website_docs_dir(self.website.path()).join(name)
        }
    }

    #[test]
    fn should_parse_metadata_in_file_order() {
        let metadata = DocMetadata::from_json(
            r#"{
                "zeta.md": {"title": "Zeta", "order": "2"},
                "alpha.md": {"order": "1", "title": "Alpha"}
            }"#,
        )
        .unwrap();

        assert_eq!(
            metadata,
            DocMetadata(vec![
                Document {
                    filename: "zeta.md".to_owned(),
                    fields: fields(&[("title", "Zeta"), ("order", "2")]),
                },
                Document {
                    filename: "alpha.md".to_owned(),
                    fields: fields(&[("order", "1"), ("title", "Alpha")]),
                },
            ])
        );
    }

    #[test]
    fn should_convert_scalar_values() {
        let metadata =
            DocMetadata::from_json(r#"{"a.md": {"order": 3, "draft": false, "tags": null}}"#)
                .unwrap();

        assert_eq!(
            metadata.0[0].fields,
            fields(&[("order", "3"), ("draft", "false"), ("tags", "")])
        );
    }

    #[test]
    fn should_keep_last_value_of_duplicate_keys() {
        let metadata =
            DocMetadata::from_json(r#"{"a.md": {"title": "Old", "order": "1", "title": "New"}}"#)
                .unwrap();

        assert_eq!(
            metadata.0[0].fields,
            fields(&[("title", "New"), ("order", "1")])
        );
    }

    #[test]
    fn should_reject_nested_values() {
        let result = DocMetadata::from_json(r#"{"a.md": {"tags": ["x", "y"]}}"#);

        assert!(matches!(
            result,
            Err(MetadataError::UnsupportedValue { document, key }) if document == "a.md" && key == "tags"
        ));
    }

    #[test]
    fn should_reject_non_object_document() {
        let result = DocMetadata::from_json(r#"{"a.md": "title: A"}"#);

        assert!(matches!(result, Err(MetadataError::DocumentNotAnObject(name)) if name == "a.md"));
    }

    #[test]
    fn should_reject_non_object_root() {
        let result = DocMetadata::from_json(r#"["a.md"]"#);

        assert!(matches!(result, Err(MetadataError::NotAnObject)));
    }

    #[test]
    fn should_render_front_matter() {
        let front_matter = render_front_matter(&fields(&[("title", "A"), ("order", "1")]));

        assert_eq!(front_matter, "---\ntitle: A\norder: 1\n---\n\n");
    }

    #[test]
    fn should_render_empty_front_matter() {
        assert_eq!(render_front_matter(&[]), "---\n---\n\n");
    }

    #[test]
    fn should_accept_nested_document_path() {
        assert_eq!(
            document_path("guides/intro.md").unwrap(),
            Path::new("guides/intro.md")
        );
    }

    #[test]
    fn should_reject_escaping_document_paths() {
        assert!(document_path("../secrets.md").is_err());
        assert!(document_path("/etc/passwd").is_err());
        assert!(document_path("").is_err());
        assert!(document_path("guides/../../x.md").is_err());
    }

    #[test]
    fn should_merge_metadata_into_docs() {
        let checkouts = Checkouts::new()
            .with_metadata(r#"{"a.md": {"title": "A", "order": "1"}}"#)
            .with_doc("a.md", "Hello");

        let count = checkouts.merge().unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            std::fs::read_to_string(checkouts.output("a.md")).unwrap(),
            "---\ntitle: A\norder: 1\n---\n\nHello"
        );
    }

    #[test]
    fn should_copy_non_utf8_body_verbatim() {
        let checkouts = Checkouts::new().with_metadata(r#"{"a.md": {"title": "A"}}"#);
        std::fs::write(
            source_docs_dir(checkouts.lattice.path()).join("a.md"),
            b"caf\xe9\n",
        )
        .unwrap();

        checkouts.merge().unwrap();

        assert_eq!(
            std::fs::read(checkouts.output("a.md")).unwrap(),
            b"---\ntitle: A\n---\n\ncaf\xe9\n".to_vec()
        );
    }

    #[test]
    fn should_overwrite_existing_output() {
        let checkouts = Checkouts::new()
            .with_metadata(r#"{"a.md": {"title": "A"}}"#)
            .with_doc("a.md", "new body\n");
        let output = checkouts.output("a.md");
        std::fs::create_dir_all(output.parent().unwrap()).unwrap();
        std::fs::write(&output, "a much longer old body that must disappear\n").unwrap();

        checkouts.merge().unwrap();

        assert_eq!(
            std::fs::read_to_string(output).unwrap(),
            "---\ntitle: A\n---\n\nnew body\n"
        );
    }

    #[test]
    fn should_fail_without_metadata_file() {
        let checkouts = Checkouts::new().with_doc("a.md", "Hello");

        let result = checkouts.merge();

        assert!(matches!(result, Err(MergeError::Read(path, _)) if path.ends_with(METADATA_FILE)));
    }

    #[test]
    fn should_not_write_anything_for_invalid_json() {
        let checkouts = Checkouts::new()
            .with_metadata(r#"{"a.md": {"title": "A""#)
            .with_doc("a.md", "Hello");

        let result = checkouts.merge();

        assert!(matches!(result, Err(MergeError::InvalidMetadata(_, MetadataError::Json(_)))));
        assert!(!website_docs_dir(checkouts.website.path()).exists());
    }

    #[test]
    fn should_stop_at_missing_source_doc() {
        let checkouts = Checkouts::new()
            .with_metadata(
                r#"{"a.md": {"title": "A"}, "missing.md": {"title": "M"}, "c.md": {"title": "C"}}"#,
            )
            .with_doc("a.md", "A")
            .with_doc("c.md", "C");

        let result = checkouts.merge();

        assert!(matches!(result, Err(MergeError::Read(path, _)) if path.ends_with("missing.md")));
        assert!(checkouts.output("a.md").exists());
        assert!(!checkouts.output("missing.md").exists());
        assert!(!checkouts.output("c.md").exists());
    }
}
