#![allow(dead_code)]

use anyhow::{Context, Result};
use digimall_reviews::store::ModerationRecord;
use serde_json::Value;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::process::Command;
use uuid::Uuid;

pub struct TestWorkspace {
    pub path: PathBuf,
}

impl TestWorkspace {
    /// Empty directory with its own (empty) config so nothing is picked up
    /// from parent directories.
    pub fn new(name: &str) -> Result<Self> {
        let path = std::env::temp_dir()
            .join("digimall_tests")
            .join(name)
            .join(Uuid::new_v4().to_string());
        fs::create_dir_all(&path)?;
        fs::write(path.join("digimall.toml"), "")?;
        Ok(Self { path })
    }

    /// Workspace whose store already holds `reviews`.
    pub fn seeded(name: &str, reviews: &[Value]) -> Result<Self> {
        let workspace = Self::new(name)?;
        write_reviews_jsonl(&workspace.data_dir(), reviews)?;
        Ok(workspace)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.path.join(".digimall")
    }

    pub fn write(&self, path: &str, content: &str) -> Result<()> {
        let p = self.path.join(path);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(p, content)?;
        Ok(())
    }

    pub fn run(&self, args: &[&str]) -> Result<String> {
        run_cmd(&self.path, args)
    }

    pub fn run_in(&self, args: &[&str], dir: &Path) -> Result<String> {
        run_cmd(dir, args)
    }

    pub fn run_err(&self, args: &[&str]) -> Result<String> {
        let output = build_cmd(&self.path, args).output()?;
        if output.status.success() {
            anyhow::bail!("digimall-reviews succeeded but expected failure");
        }
        Ok(String::from_utf8(output.stderr)?)
    }

    pub fn run_raw(&self, args: &[&str]) -> Result<std::process::Output> {
        Ok(build_cmd(&self.path, args).output()?)
    }

    pub fn history(&self) -> Result<Vec<ModerationRecord>> {
        let path = self.data_dir().join("moderation.jsonl");
        if !path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(path)?;
        Ok(content
            .lines()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str::<ModerationRecord>(l).ok())
            .collect())
    }
}

fn build_cmd(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_digimall-reviews"));
    cmd.args(args)
        .current_dir(dir)
        .env_remove("DIGIMALL_API_TOKEN");
    cmd
}

fn run_cmd(dir: &Path, args: &[&str]) -> Result<String> {
    let output = build_cmd(dir, args).output()?;
    if !output.status.success() {
        anyhow::bail!(
            "digimall-reviews failed: {}",
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8(output.stdout)?)
}

/// Parse CLI JSON output into a serde_json::Value.
pub fn json(output: &str) -> Result<Value> {
    serde_json::from_str(output).with_context(|| format!("Invalid JSON: {}", truncate(output, 200)))
}

fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        s.to_string()
    } else {
        format!("{}...", &s[..max])
    }
}

/// Ids of the `reviews` array of a `list --json` page.
pub fn page_ids(output: &str) -> Result<Vec<String>> {
    let page = json(output)?;
    let reviews = page["reviews"]
        .as_array()
        .context("reviews should be array")?;
    reviews
        .iter()
        .map(|review| {
            review["id"]
                .as_str()
                .map(str::to_string)
                .context("id should be string")
        })
        .collect()
}

/// Overrides for building test reviews with stable defaults.
#[derive(Debug, Clone, Default)]
pub struct ReviewOverrides<'a> {
    pub review_type: Option<&'a str>,
    pub title: Option<&'a str>,
    pub content: Option<&'a str>,
    pub author: Option<&'a str>,
    pub target: Option<&'a str>,
    pub flagged: Option<bool>,
    pub helpful: Option<u32>,
    pub created_at: Option<&'a str>,
}

/// Build a review JSON value in the wire format.
pub fn review_json(id: &str, status: &str, rating: u8, overrides: ReviewOverrides<'_>) -> Value {
    let created_at = overrides.created_at.unwrap_or("2024-03-01T12:00:00Z");
    let target = overrides
        .target
        .map(str::to_string)
        .unwrap_or_else(|| format!("Product {}", id));
    let author = overrides
        .author
        .map(str::to_string)
        .unwrap_or_else(|| format!("Customer {}", id));
    serde_json::json!({
        "id": id,
        "type": overrides.review_type.unwrap_or("PRODUCT"),
        "target": { "id": format!("target-{}", id), "name": target },
        "author": { "id": format!("customer-{}", id), "name": author },
        "rating": rating,
        "title": overrides.title.map(str::to_string).unwrap_or_else(|| format!("Review {}", id)),
        "content": overrides.content.unwrap_or("Solid product, fast delivery."),
        "images": [],
        "status": status,
        "isFlagged": overrides.flagged.unwrap_or(status == "FLAGGED"),
        "isVerifiedPurchase": true,
        "helpfulCount": overrides.helpful.unwrap_or(0),
        "createdAt": created_at,
        "updatedAt": created_at
    })
}

pub fn write_reviews_jsonl(dir: &Path, reviews: &[Value]) -> Result<()> {
    fs::create_dir_all(dir)?;
    let file = fs::File::create(dir.join("reviews.jsonl"))?;
    let mut writer = BufWriter::new(file);
    for review in reviews {
        serde_json::to_writer(&mut writer, review)?;
        writer.write_all(b"\n")?;
    }
    Ok(())
}

/// Four reviews covering every status, one day apart (r1 oldest).
pub fn standard_reviews() -> Vec<Value> {
    vec![
        review_json(
            "r1",
            "PENDING",
            5,
            ReviewOverrides {
                created_at: Some("2024-03-01T12:00:00Z"),
                helpful: Some(4),
                ..Default::default()
            },
        ),
        review_json(
            "r2",
            "APPROVED",
            2,
            ReviewOverrides {
                created_at: Some("2024-03-02T12:00:00Z"),
                review_type: Some("VENDOR"),
                target: Some("Acme Electronics"),
                ..Default::default()
            },
        ),
        review_json(
            "r3",
            "FLAGGED",
            1,
            ReviewOverrides {
                created_at: Some("2024-03-03T12:00:00Z"),
                content: Some("Fake review, do not trust"),
                ..Default::default()
            },
        ),
        review_json(
            "r4",
            "PENDING",
            4,
            ReviewOverrides {
                created_at: Some("2024-03-04T12:00:00Z"),
                helpful: Some(9),
                ..Default::default()
            },
        ),
    ]
}
