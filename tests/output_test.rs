//! Output organizer tests: file layout, naming and failure behaviour.

use llmschema::output::{emit, write_directory, write_document, OVERVIEW_STEM};
use llmschema::schema::{Column, Relation, Schema, Table};
use llmschema::{Error, Format, OutputConfig};
use std::fs;
use tempfile::TempDir;

fn table(name: &str, references: &[(&str, &str)]) -> Table {
    let mut t = Table::new(name);
    let mut id = Column::new("id", "integer");
    id.nullable = false;
    t.columns = vec![id];
    t.primary_key = vec!["id".to_string()];
    for (column, target) in references {
        t.columns.push(Column::new(*column, "integer"));
        t.relations
            .push(Relation::many_to_one(*column, *target, "id"));
    }
    t
}

fn blog() -> Schema {
    Schema::new(vec![
        table("posts", &[("author_id", "users")]),
        table("users", &[]),
        table("comments", &[("post_id", "posts"), ("author_id", "users")]),
        table("categories", &[("parent_id", "categories")]),
    ])
}

#[test]
fn test_directory_layout() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("nested").join("docs");

    let written = write_directory(&blog(), Format::Text, &out).unwrap();
    assert_eq!(written.files.len(), 5);
    assert_eq!(written.files[0], out.join(format!("{}.txt", OVERVIEW_STEM)));
    for name in ["posts", "users", "comments", "categories"] {
        assert!(out.join(format!("{}.txt", name)).is_file(), "{} missing", name);
    }
}

#[test]
fn test_overview_is_alphabetical_with_distinct_references() {
    let dir = TempDir::new().unwrap();
    write_directory(&blog(), Format::Text, dir.path()).unwrap();

    let overview = fs::read_to_string(dir.path().join("_overview.txt")).unwrap();
    let listing: Vec<&str> = overview.lines().skip(3).collect();
    assert_eq!(
        listing,
        vec![
            "categories (references: categories)",
            "comments (references: posts, users)",
            "posts (references: users)",
            "users",
        ]
    );
}

#[test]
fn test_per_table_files_carry_incoming_references() {
    let dir = TempDir::new().unwrap();
    write_directory(&blog(), Format::Markdown, dir.path()).unwrap();

    let users = fs::read_to_string(dir.path().join("users.md")).unwrap();
    assert!(users.contains(
        "### Referenced by\n\n- posts.author_id → id (many posts to one users)\n- comments.author_id → id (many comments to one users)\n"
    ));

    let categories = fs::read_to_string(dir.path().join("categories.md")).unwrap();
    assert!(categories.contains("- parent_id → categories.id (many categories to one categories)\n"));
    assert!(categories.contains("- categories.parent_id → id (many categories to one categories)\n"));

    let comments = fs::read_to_string(dir.path().join("comments.md")).unwrap();
    assert!(!comments.contains("### Referenced by"));
}

#[test]
fn test_single_document_preserves_extraction_order() {
    let mut sink = Vec::new();
    write_document(&blog(), Format::Text, &mut sink, "buffer").unwrap();
    let doc = String::from_utf8(sink).unwrap();

    let headers: Vec<&str> = doc.lines().filter(|l| l.starts_with("TABLE ")).collect();
    assert_eq!(
        headers,
        vec![
            "TABLE posts (PK: id)",
            "TABLE users (PK: id)",
            "TABLE comments (PK: id)",
            "TABLE categories (PK: id)",
        ]
    );
    // Incoming references only appear in per-table documents
    assert!(!doc.contains("REFERENCED BY"));
}

#[test]
fn test_table_name_cannot_escape_directory() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let schema = Schema::new(vec![table("../escape", &[])]);

    write_directory(&schema, Format::Text, &out).unwrap();
    assert!(out.join(".._escape.txt").is_file());
    assert!(!dir.path().join("escape.txt").exists());
}

#[test]
fn test_overview_collision_writes_nothing() {
    let dir = TempDir::new().unwrap();
    let out = dir.path().join("docs");
    let schema = Schema::new(vec![table("users", &[]), table("_overview", &[])]);

    let err = write_directory(&schema, Format::Markdown, &out).unwrap_err();
    assert!(matches!(err, Error::InvalidConfiguration(_)));
    assert!(!out.exists());
}

#[test]
fn test_write_failure_names_target() {
    let dir = TempDir::new().unwrap();
    let blocker = dir.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let config = OutputConfig::new(Format::Text, None, Some(blocker.clone()), 0).unwrap();
    match emit(&blog(), &config) {
        Err(Error::Write { target, .. }) => assert!(target.contains("not_a_dir")),
        other => panic!("expected write failure, got {:?}", other),
    }
}

#[test]
fn test_empty_schema_in_directory_mode() {
    let dir = TempDir::new().unwrap();
    let written = write_directory(&Schema::default(), Format::Markdown, dir.path()).unwrap();

    assert_eq!(written.files.len(), 1);
    let overview = fs::read_to_string(&written.files[0]).unwrap();
    assert!(overview.ends_with("## Tables\n\n"));
}
