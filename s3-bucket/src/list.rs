use serde::Deserialize;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectSummary {
    pub key: String,
    pub last_modified: OffsetDateTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ListBucketResult {
    #[serde(default)]
    contents: Vec<Contents>,
    #[serde(default)]
    is_truncated: bool,
    next_continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Contents {
    key: String,
    last_modified: String,
}

/// One page of a `ListObjectsV2` response.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ListPage {
    pub objects: Vec<ObjectSummary>,
    pub next_continuation_token: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("invalid ListObjectsV2 response")]
    InvalidXml(#[from] quick_xml::DeError),
    #[error("invalid LastModified timestamp '{1}' for object '{0}'")]
    InvalidTimestamp(String, String, #[source] time::error::Parse),
    #[error("truncated listing without continuation token")]
    MissingContinuationToken,
}

pub(crate) fn parse_list_page(xml: &str) -> Result<ListPage, ParseError> {
    let result: ListBucketResult = quick_xml::de::from_str(xml)?;
    let objects = result
        .contents
        .into_iter()
        .map(|c| {
            let last_modified = OffsetDateTime::parse(&c.last_modified, &Rfc3339)
                .map_err(|e| ParseError::InvalidTimestamp(c.key.clone(), c.last_modified, e))?;
            Ok(ObjectSummary {
                key: c.key,
                last_modified,
            })
        })
        .collect::<Result<Vec<_>, ParseError>>()?;
    let next_continuation_token = if result.is_truncated {
        Some(
            result
                .next_continuation_token
                .ok_or(ParseError::MissingContinuationToken)?,
        )
    } else {
        None
    };
    Ok(ListPage {
        objects,
        next_continuation_token,
    })
}
