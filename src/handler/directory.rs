//! Directory responder
//!
//! A directory is served through its `index.html` or a generated listing,
//! always from a URL ending in `/` so relative links inside it resolve.

use super::{file, DirEntry, FileStat, HandlerError, RequestContext, ResponseIntent, ServeOptions};
use std::path::Path;

const INDEX_FILE: &str = "index.html";

pub async fn respond(
    dir: &Path,
    trailing_slash: bool,
    ctx: &RequestContext,
    options: &ServeOptions,
) -> Result<ResponseIntent, HandlerError> {
    let index_path = dir.join(INDEX_FILE);
    let index = tokio::fs::metadata(&index_path).await.ok();

    if index.is_none() && !options.auto_index {
        return Ok(ResponseIntent::Delegate(None));
    }

    if !trailing_slash {
        return Ok(ResponseIntent::Redirect {
            location: with_trailing_slash(ctx),
        });
    }

    if let Some(meta) = index {
        return file::respond(&index_path, &FileStat::from(&meta), ctx, options).await;
    }

    Ok(ResponseIntent::Listing {
        url: ctx.url.clone(),
        entries: list_entries(dir).await?,
        live_reload_path: options.live_reload_path.clone(),
    })
}

/// Same URL with `/` appended to the path, query preserved
fn with_trailing_slash(ctx: &RequestContext) -> String {
    match ctx.query.as_deref() {
        Some(query) => format!("{}/?{query}", ctx.path),
        None => format!("{}/", ctx.path),
    }
}

/// Immediate children of `dir`, sorted by name
async fn list_entries(dir: &Path) -> Result<Vec<DirEntry>, HandlerError> {
    let mut reader = tokio::fs::read_dir(dir)
        .await
        .map_err(HandlerError::io("failed to list", dir))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(HandlerError::io("failed to list", dir))?
    {
        let path = entry.path();
        // Follow symlinks like a plain stat; dangling links list as files
        let is_directory = tokio::fs::metadata(&path)
            .await
            .is_ok_and(|meta| meta.is_dir());

        entries.push(DirEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_directory,
            extension_tag: if is_directory {
                String::new()
            } else {
                extension_tag(&path)
            },
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

fn extension_tag(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(path: &str, query: Option<&str>) -> RequestContext {
        RequestContext {
            url: query.map_or_else(|| path.to_string(), |q| format!("{path}?{q}")),
            path: path.to_string(),
            query: query.map(ToString::to_string),
            range: None,
            if_modified_since: None,
        }
    }

    fn site() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("docs/img")).unwrap();
        std::fs::write(root.join("docs/index.html"), "<h1>docs</h1>").unwrap();
        std::fs::create_dir_all(root.join("assets/fonts")).unwrap();
        std::fs::write(root.join("assets/app.JS"), "x").unwrap();
        std::fs::write(root.join("assets/README"), "x").unwrap();
        std::fs::write(root.join("assets/.hidden"), "x").unwrap();
        std::fs::write(root.join("assets/bundle.min.css"), "x").unwrap();
        tmp
    }

    #[tokio::test]
    async fn test_redirect_even_with_index() {
        let tmp = site();
        let intent = respond(
            &tmp.path().join("docs"),
            false,
            &ctx("/docs", Some("v=1")),
            &ServeOptions::default(),
        )
        .await
        .unwrap();

        assert!(matches!(
            intent,
            ResponseIntent::Redirect { ref location } if location == "/docs/?v=1"
        ));
    }

    #[tokio::test]
    async fn test_index_served_with_trailing_slash() {
        let tmp = site();
        let intent = respond(
            &tmp.path().join("docs"),
            true,
            &ctx("/docs/", None),
            &ServeOptions::default(),
        )
        .await
        .unwrap();

        match intent {
            ResponseIntent::FullContent { body, content_type, .. } => {
                assert_eq!(body.as_ref(), b"<h1>docs</h1>");
                assert_eq!(content_type, "text/html; charset=UTF-8");
            }
            other => panic!("expected index.html, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_listing_sorted_and_tagged() {
        let tmp = site();
        let intent = respond(
            &tmp.path().join("assets"),
            true,
            &ctx("/assets/", None),
            &ServeOptions::default(),
        )
        .await
        .unwrap();

        let ResponseIntent::Listing { url, entries, .. } = intent else {
            panic!("expected listing");
        };
        assert_eq!(url, "/assets/");

        let tags: Vec<(&str, bool, &str)> = entries
            .iter()
            .map(|e| (e.name.as_str(), e.is_directory, e.extension_tag.as_str()))
            .collect();
        assert_eq!(
            tags,
            vec![
                (".hidden", false, ""),
                ("README", false, ""),
                ("app.JS", false, "js"),
                ("bundle.min.css", false, "css"),
                ("fonts", true, ""),
            ]
        );
    }

    #[tokio::test]
    async fn test_no_index_without_auto_index_delegates() {
        let tmp = site();
        let options = ServeOptions {
            auto_index: false,
            ..ServeOptions::default()
        };

        // Delegation wins over the trailing-slash redirect
        for trailing_slash in [false, true] {
            let intent = respond(
                &tmp.path().join("assets"),
                trailing_slash,
                &ctx("/assets", None),
                &options,
            )
            .await
            .unwrap();
            assert!(matches!(intent, ResponseIntent::Delegate(None)));
        }
    }

    #[tokio::test]
    async fn test_index_still_served_without_auto_index() {
        let tmp = site();
        let options = ServeOptions {
            auto_index: false,
            ..ServeOptions::default()
        };
        let intent = respond(&tmp.path().join("docs"), true, &ctx("/docs/", None), &options)
            .await
            .unwrap();
        assert!(matches!(intent, ResponseIntent::FullContent { .. }));
    }
}
