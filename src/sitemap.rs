//! XML sitemap for the public glossary site.
//!
//! Static pages first, then one `/terms/{slug}` entry per term with its
//! `updatedAt` as `lastmod`.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

use glossary_core::models::Term;
use glossary_core::store::Store;

use crate::config::Config;
use crate::sqlite_store::SqliteStore;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// `(path, priority, changefreq)` of the site's fixed pages.
pub const STATIC_ROUTES: &[(&str, f32, &str)] = &[
    ("/", 1.0, "daily"),
    ("/terms", 0.9, "weekly"),
    ("/super-index", 0.9, "weekly"),
    ("/about", 0.7, "monthly"),
    ("/contact", 0.5, "yearly"),
    ("/recommended", 0.8, "weekly"),
    ("/commands", 0.6, "monthly"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub priority: f32,
    pub changefreq: &'static str,
}

pub fn sitemap_entries(
    site_url: &str,
    terms: &[Term],
    generated_at: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let base = site_url.trim_end_matches('/');
    let mut entries: Vec<SitemapEntry> = STATIC_ROUTES
        .iter()
        .map(|&(path, priority, changefreq)| SitemapEntry {
            loc: format!("{}{}", base, path),
            lastmod: generated_at,
            priority,
            changefreq,
        })
        .collect();

    entries.extend(terms.iter().map(|term| SitemapEntry {
        loc: format!("{}/terms/{}", base, term.slug),
        lastmod: term.updated_at.unwrap_or(generated_at),
        priority: 0.8,
        changefreq: "daily",
    }));
    entries
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS)]),
    ))?;

    for entry in entries {
        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text(&mut writer, "loc", &entry.loc)?;
        write_text(
            &mut writer,
            "lastmod",
            &entry.lastmod.to_rfc3339_opts(SecondsFormat::Secs, true),
        )?;
        write_text(&mut writer, "changefreq", entry.changefreq)?;
        write_text(&mut writer, "priority", &format!("{:.1}", entry.priority))?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;
    let mut xml = String::from_utf8(writer.into_inner().into_inner())?;
    xml.push('\n');
    Ok(xml)
}

fn write_text(writer: &mut Writer<Cursor<Vec<u8>>>, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

pub async fn build_sitemap(store: &dyn Store, site_url: &str) -> Result<String> {
    let terms = store.list_terms().await?;
    render_sitemap(&sitemap_entries(site_url, &terms, Utc::now()))
}

pub async fn run_sitemap(config: &Config, output: Option<&Path>) -> Result<()> {
    let store = SqliteStore::connect(config).await?;
    let xml = build_sitemap(&store, &config.server.site_url).await;
    store.close().await;
    let xml = xml?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, &xml)?;
            eprintln!("Wrote sitemap to {}", path.display());
        }
        None => print!("{}", xml),
    }
    Ok(())
}
