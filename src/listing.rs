//! The nightly bundle listing page: group the bundles in the bucket by upload
//! day and version, render them and publish the page next to them.

use crate::bundle::{is_nightly_bundle, BundleKey, BundleKeyError, BUNDLE_PREFIX};
use s3_bucket::{ObjectStore, ObjectSummary};
use serde::Serialize;
use std::{collections::BTreeMap, io::Write};
use tera::{Context, Tera};
use time::{Date, UtcOffset};

pub const DEFAULT_BUCKET: &str = "lattice";
pub const INDEX_KEY: &str = "nightly/index.html";
pub const INDEX_CONTENT_TYPE: &str = "text/html";
pub const UPLOADED_MESSAGE: &str = "uploaded nightly bundle listing";
pub const DEFAULT_TEMPLATE: &str = include_str!("../templates/listing.html");

const TEMPLATE_NAME: &str = "listing.html";

#[derive(Debug, thiserror::Error)]
pub enum ListingError {
    #[error("failed to list bucket")]
    List(#[source] s3_bucket::Error),
    #[error("failed to upload '{}'", INDEX_KEY)]
    Upload(#[source] s3_bucket::Error),
    #[error("unexpected object in bucket")]
    InvalidBundleKey(#[from] BundleKeyError),
    #[error("failed to render listing template")]
    Template(#[from] tera::Error),
    #[error("failed to write output")]
    Output(#[source] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BundleFile {
    pub arch: String,
    pub path: String,
}

/// Bundles by upload day, then by version, in listing order within a version.
pub type DayGrouping = BTreeMap<Date, BTreeMap<String, Vec<BundleFile>>>;

pub fn group_by_day(objects: &[ObjectSummary]) -> Result<DayGrouping, BundleKeyError> {
    let mut days = DayGrouping::new();
    for object in objects.iter().filter(|o| is_nightly_bundle(&o.key)) {
        let BundleKey { version, arch } = BundleKey::parse(&object.key)?;
        days.entry(object.last_modified.to_offset(UtcOffset::UTC).date())
            .or_default()
            .entry(version)
            .or_default()
            .push(BundleFile {
                arch,
                path: object.key.clone(),
            });
    }
    Ok(days)
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct ListingPage<'a> {
    bucket: &'a str,
    days: Vec<DayListing<'a>>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct DayListing<'a> {
    date: String,
    versions: Vec<VersionListing<'a>>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
struct VersionListing<'a> {
    version: &'a str,
    bundles: &'a [BundleFile],
}

impl<'a> ListingPage<'a> {
    fn new(days: &'a DayGrouping, bucket: &'a str) -> Self {
        let days = days
            .iter()
            .rev()
            .map(|(date, versions)| DayListing {
                date: date.to_string(),
                versions: versions
                    .iter()
                    .map(|(version, bundles)| VersionListing { version, bundles })
                    .collect(),
            })
            .collect();
        ListingPage { bucket, days }
    }
}

/// Renders the listing page, newest day first. Values are HTML-escaped.
pub fn render_listing(
    days: &DayGrouping,
    bucket: &str,
    template: &str,
) -> Result<String, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_template(TEMPLATE_NAME, template)?;
    let context = Context::from_serialize(ListingPage::new(days, bucket))?;
    tera.render(TEMPLATE_NAME, &context)
}

/// Lists the bucket and renders the listing page for it.
pub fn generate_listing(
    store: &impl ObjectStore,
    bucket: &str,
    template: &str,
) -> Result<String, ListingError> {
    let objects = store
        .list_objects(BUNDLE_PREFIX)
        .map_err(ListingError::List)?;
    let days = group_by_day(&objects)?;
    tracing::info!(
        "found {} bundles from {} days in bucket '{}'",
        days.values().flat_map(|v| v.values()).map(Vec::len).sum::<usize>(),
        days.len(),
        bucket
    );
    Ok(render_listing(&days, bucket, template)?)
}

pub fn publish_listing(store: &impl ObjectStore, html: &str) -> Result<(), ListingError> {
    tracing::debug!("uploading {} bytes to '{}'", html.len(), INDEX_KEY);
    store
        .put_object(INDEX_KEY, html.as_bytes(), INDEX_CONTENT_TYPE)
        .map_err(ListingError::Upload)
}

/// Uploads the rendered page and confirms it on `out`; a dry run writes the
/// page to `out` instead.
pub fn finish_listing(
    store: &impl ObjectStore,
    html: &str,
    dry_run: bool,
    out: &mut impl Write,
) -> Result<(), ListingError> {
    if dry_run {
        return out.write_all(html.as_bytes()).map_err(ListingError::Output);
    }
    publish_listing(store, html)?;
    writeln!(out, "{}", UPLOADED_MESSAGE).map_err(ListingError::Output)
}
