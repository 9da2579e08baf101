//! Server-side HTML rendering for the film page.
//!
//! The template directory holds one page template (`index.html`) and any
//! number of fragments, each a standalone file named `<fragment>.html`. The
//! page includes fragments for its list items, so a fragment rendered on its
//! own is exactly what the client appends to an already rendered page.

use std::path::{Path, PathBuf};

use tera::{Context, Tera};
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::core::{AppError, Film, FilmSections};

pub const PAGE_TEMPLATE: &str = "index.html";
pub const FILM_FRAGMENT: &str = "film-list-element";

/// Templates are parsed once and shared; [`FragmentRenderer::reload`] re-reads
/// the directory.
pub struct FragmentRenderer {
    tera: RwLock<Tera>,
    template_dir: PathBuf,
    reload_on_render: bool,
}

impl FragmentRenderer {
    /// Parses every `*.html` under `template_dir`. Fails if any file does not
    /// parse or if the page or film fragment template is missing.
    pub fn new(template_dir: impl AsRef<Path>, reload_on_render: bool) -> Result<Self, AppError> {
        let template_dir = template_dir.as_ref().to_path_buf();
        let glob = format!("{}/**/*.html", template_dir.display());
        let tera = Tera::new(&glob)?;
        ensure_required(&tera)?;
        info!(
            dir = %template_dir.display(),
            templates = tera.get_template_names().count(),
            "templates loaded"
        );
        Ok(Self {
            tera: RwLock::new(tera),
            template_dir,
            reload_on_render,
        })
    }

    /// Re-reads the template directory. On failure the previously parsed
    /// templates stay in place.
    ///
    /// The parse runs on the blocking pool and the write lock is only held
    /// for the swap, so renders keep going while a reload is in flight.
    pub async fn reload(&self) -> Result<(), AppError> {
        let mut fresh = self.tera.read().await.clone();
        let fresh = tokio::task::spawn_blocking(move || {
            fresh.full_reload()?;
            ensure_required(&fresh)?;
            Ok::<Tera, AppError>(fresh)
        })
        .await
        .map_err(|e| AppError::Template(tera::Error::msg(format!("template reload task failed: {e}"))))??;
        *self.tera.write().await = fresh;
        debug!(dir = %self.template_dir.display(), "templates reloaded");
        Ok(())
    }

    /// Renders the whole page. Each key of `sections` becomes a top-level
    /// template variable.
    pub async fn render_full(&self, sections: &FilmSections) -> Result<String, AppError> {
        let context = Context::from_serialize(sections)?;
        self.render(PAGE_TEMPLATE, &context).await
    }

    /// Renders `<fragment>.html` alone with `film` bound as the only variable.
    pub async fn render_fragment(&self, fragment: &str, film: &Film) -> Result<String, AppError> {
        let mut context = Context::new();
        context.insert("film", film);
        self.render(&format!("{fragment}.html"), &context).await
    }

    async fn render(&self, template: &str, context: &Context) -> Result<String, AppError> {
        if self.reload_on_render {
            self.reload().await?;
        }
        let tera = self.tera.read().await;
        Ok(tera.render(template, context)?)
    }
}

fn ensure_required(tera: &Tera) -> Result<(), AppError> {
    let film_fragment = format!("{FILM_FRAGMENT}.html");
    for required in [PAGE_TEMPLATE, film_fragment.as_str()] {
        if !tera.get_template_names().any(|name| name == required) {
            return Err(AppError::Template(tera::Error::msg(format!(
                "template '{required}' not found"
            ))));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::FILMS_SECTION;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn repo_templates() -> PathBuf {
        PathBuf::from(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
    }

    fn catalog_sections() -> FilmSections {
        FilmSections::from([(FILMS_SECTION.to_string(), Film::catalog())])
    }

    fn scratch_templates(page: &str, fragment: &str) -> TempDir {
        let dir = tempfile::Builder::new()
            .prefix("templates")
            .tempdir()
            .unwrap();
        fs::write(dir.path().join(PAGE_TEMPLATE), page).unwrap();
        fs::write(dir.path().join(format!("{FILM_FRAGMENT}.html")), fragment).unwrap();
        dir
    }

    #[tokio::test]
    async fn full_page_lists_every_film() {
        let renderer = FragmentRenderer::new(repo_templates(), false).unwrap();
        let html = renderer.render_full(&catalog_sections()).await.unwrap();

        assert!(html.contains("<!DOCTYPE html>"));
        for film in Film::catalog() {
            assert!(html.contains(&film.title), "missing {}", film.title);
            assert!(html.contains(&film.director), "missing {}", film.director);
        }
    }

    #[tokio::test]
    async fn fragment_has_no_page_scaffold() {
        let renderer = FragmentRenderer::new(repo_templates(), false).unwrap();
        let html = renderer
            .render_fragment(FILM_FRAGMENT, &Film::new("X", "Y"))
            .await
            .unwrap();

        assert!(html.contains('X'));
        assert!(html.contains('Y'));
        assert!(html.trim_start().starts_with("<li"));
        assert!(!html.contains("<html"));
        assert!(!html.contains("<form"));
        assert!(!html.contains("film-list\""));
    }

    #[tokio::test]
    async fn film_text_is_escaped() {
        let renderer = FragmentRenderer::new(repo_templates(), false).unwrap();
        let html = renderer
            .render_fragment(FILM_FRAGMENT, &Film::new("<script>alert(1)</script>", "Q & A"))
            .await
            .unwrap();

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("Q &amp; A"));
    }

    #[tokio::test]
    async fn unknown_fragment_is_a_template_error() {
        let renderer = FragmentRenderer::new(repo_templates(), false).unwrap();
        let err = renderer
            .render_fragment("no-such-fragment", &Film::new("X", "Y"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Template(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn missing_section_is_a_template_error() {
        let renderer = FragmentRenderer::new(repo_templates(), false).unwrap();
        let sections = FilmSections::from([("movies".to_string(), Film::catalog())]);
        let err = renderer.render_full(&sections).await.unwrap_err();
        assert!(matches!(err, AppError::Template(_)), "got {err:?}");
    }

    #[test]
    fn malformed_source_fails_at_load() {
        let dir = scratch_templates("{% for film in films %}<ul>", "<li>{{ film.title }}</li>");
        let err = FragmentRenderer::new(dir.path(), false).err().unwrap();
        assert!(matches!(err, AppError::Template(_)), "got {err:?}");
    }

    #[test]
    fn missing_fragment_file_fails_at_load() {
        let dir = tempfile::Builder::new()
            .prefix("templates")
            .tempdir()
            .unwrap();
        fs::write(dir.path().join(PAGE_TEMPLATE), "<html></html>").unwrap();
        let err = FragmentRenderer::new(dir.path(), false).err().unwrap();
        assert!(matches!(err, AppError::Template(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn reload_picks_up_edits() {
        let dir = scratch_templates("<ul></ul>", "<li>{{ film.title }}</li>");
        let renderer = FragmentRenderer::new(dir.path(), false).unwrap();
        let film = Film::new("Arrival", "Denis Villeneuve");

        fs::write(
            dir.path().join(format!("{FILM_FRAGMENT}.html")),
            "<li>{{ film.director }}</li>",
        )
        .unwrap();
        let cached = renderer.render_fragment(FILM_FRAGMENT, &film).await.unwrap();
        assert_eq!(cached, "<li>Arrival</li>");

        renderer.reload().await.unwrap();
        let fresh = renderer.render_fragment(FILM_FRAGMENT, &film).await.unwrap();
        assert_eq!(fresh, "<li>Denis Villeneuve</li>");
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_templates() {
        let dir = scratch_templates("<ul></ul>", "<li>{{ film.title }}</li>");
        let renderer = FragmentRenderer::new(dir.path(), false).unwrap();

        fs::write(dir.path().join(format!("{FILM_FRAGMENT}.html")), "<li>{{ film.").unwrap();
        assert!(renderer.reload().await.is_err());

        let html = renderer
            .render_fragment(FILM_FRAGMENT, &Film::new("Heat", "Michael Mann"))
            .await
            .unwrap();
        assert_eq!(html, "<li>Heat</li>");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn concurrent_renders_with_reload_on_render() {
        let renderer = Arc::new(FragmentRenderer::new(repo_templates(), true).unwrap());

        let mut renders = tokio::task::JoinSet::new();
        for i in 0..8 {
            let renderer = renderer.clone();
            renders.spawn(async move {
                let film = Film::new(format!("Film {i}"), format!("Director {i}"));
                let html = renderer.render_fragment(FILM_FRAGMENT, &film).await?;
                Ok::<bool, AppError>(html.contains(&film.title))
            });
        }
        while let Some(joined) = renders.join_next().await {
            assert!(joined.unwrap().unwrap());
        }
        assert!(renderer.render_full(&catalog_sections()).await.is_ok());
    }

    #[tokio::test]
    async fn reload_on_render_reads_source_every_call() {
        let dir = scratch_templates("<ul></ul>", "<li>{{ film.title }}</li>");
        let renderer = FragmentRenderer::new(dir.path(), true).unwrap();

        fs::write(
            dir.path().join(format!("{FILM_FRAGMENT}.html")),
            "<li class=\"new\">{{ film.title }}</li>",
        )
        .unwrap();
        let html = renderer
            .render_fragment(FILM_FRAGMENT, &Film::new("Alien", "Ridley Scott"))
            .await
            .unwrap();
        assert_eq!(html, "<li class=\"new\">Alien</li>");
    }
}
