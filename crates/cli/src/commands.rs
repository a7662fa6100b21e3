use crate::Command;
use annotator::{
    list_pdfs, render_ink_preview, save_preview, ImportOptions, InkSession, InkStore,
    SaveOptions, Settings, StateStore, ViewerState,
};
use anyhow::{bail, Context, Result};
use page_geometry::Point;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn run(command: Command, settings: &Settings) -> Result<()> {
    match command {
        Command::Info { pdf } => info_cmd(&pdf, settings),
        Command::Browse { dir } => browse(&dir),
        Command::Apply {
            pdf,
            ink,
            out,
            keep_existing,
        } => apply(&pdf, ink, out, keep_existing, settings),
        Command::Extract {
            pdf,
            out,
            remove,
            only_own,
        } => extract(&pdf, out, remove, only_own, settings),
        Command::Map {
            pdf,
            page,
            x,
            y,
            inverse,
        } => map(&pdf, page, Point::new(x, y), inverse, settings),
        Command::Preview {
            pdf,
            page,
            out,
            ink,
            scale,
        } => preview(&pdf, page, &out, ink, scale, settings),
        Command::Recent { prune } => recent(prune),
    }
}

fn open_session(pdf: &Path, settings: &Settings) -> Result<InkSession> {
    InkSession::open(pdf, settings.view_width)
        .with_context(|| format!("failed to open {}", pdf.display()))
}

fn sidecar_or(pdf: &Path, explicit: Option<PathBuf>) -> PathBuf {
    explicit.unwrap_or_else(|| InkStore::sidecar_path(pdf))
}

/// Remember the document in the recent files list, keeping its viewer state
fn remember(pdf: &Path) {
    let mut state = StateStore::load_or_default(StateStore::default_path());
    let viewer = state.get(pdf).unwrap_or_default();
    state.record(pdf, viewer);
    if let Err(e) = state.save() {
        warn!(error = %e, "failed to save viewer state");
    }
}

fn info_cmd(pdf: &Path, settings: &Settings) -> Result<()> {
    let session = open_session(pdf, settings)?;
    println!("{}: {} pages", pdf.display(), session.page_count());

    for page in 1..=session.page_count() {
        let geometry = session.geometry(page)?;
        let display = geometry.display_size();
        let [mllx, mlly, murx, mury] = geometry.media_box().to_array();
        let [cllx, clly, curx, cury] = geometry.crop_box().to_array();
        let annotations = session.document().ink_annotations(page)?.len();

        println!(
            "  page {:>3}: media [{} {} {} {}] crop [{} {} {} {}] rotate {:>3} display {} x {} ink {}",
            page,
            mllx,
            mlly,
            murx,
            mury,
            cllx,
            clly,
            curx,
            cury,
            geometry.rotation().degrees(),
            display.width,
            display.height,
            annotations,
        );
    }
    Ok(())
}

fn browse(dir: &Path) -> Result<()> {
    let entries =
        list_pdfs(dir).with_context(|| format!("failed to list {}", dir.display()))?;

    if entries.is_empty() {
        println!("no PDFs in {}", dir.display());
        return Ok(());
    }

    for entry in entries {
        let modified = entry
            .modified
            .map(|m| m.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{} {:>10} {} {}",
            if entry.has_ink { "*" } else { " " },
            entry.size,
            modified,
            entry.name
        );
    }
    Ok(())
}

fn apply(
    pdf: &Path,
    ink: Option<PathBuf>,
    out: Option<PathBuf>,
    keep_existing: bool,
    settings: &Settings,
) -> Result<()> {
    let ink_path = sidecar_or(pdf, ink);
    let store = InkStore::load(&ink_path)
        .with_context(|| format!("failed to load strokes from {}", ink_path.display()))?;

    let mut session = open_session(pdf, settings)?;
    let options = SaveOptions {
        author: settings.author.clone(),
        simplify_tolerance: settings.simplify_tolerance,
        replace_existing: !keep_existing,
    };
    let report = session.save_inking_to_pdf(&store, &options)?;

    for page in &report.skipped_pages {
        eprintln!("warning: page {} does not exist, its strokes were skipped", page);
    }
    for id in &report.skipped_strokes {
        eprintln!("warning: stroke {} could not be written and was skipped", id);
    }

    let out = out.unwrap_or_else(|| pdf.to_path_buf());
    session
        .write(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "wrote {} annotations ({} replaced) to {}",
        report.written,
        report.removed,
        out.display()
    );
    remember(&out);
    Ok(())
}

fn extract(
    pdf: &Path,
    out: Option<PathBuf>,
    remove: bool,
    only_own: bool,
    settings: &Settings,
) -> Result<()> {
    let out = sidecar_or(pdf, out);
    let mut store = InkStore::load_or_default(&out)
        .with_context(|| format!("failed to load strokes from {}", out.display()))?;
    if store.source().is_none() {
        if let Some(name) = pdf.file_name() {
            store = store.with_source(name.to_string_lossy());
        }
    }

    let mut session = open_session(pdf, settings)?;
    let imported = session.import_ink(
        &mut store,
        &ImportOptions {
            remove_from_pdf: remove,
            only_own,
        },
    )?;

    store
        .save(&out)
        .with_context(|| format!("failed to write {}", out.display()))?;

    if remove && imported > 0 {
        session
            .write(pdf)
            .with_context(|| format!("failed to write {}", pdf.display()))?;
        info!(removed = imported, "removed extracted annotations from PDF");
    }

    println!("extracted {} strokes to {}", imported, out.display());
    Ok(())
}

fn map(pdf: &Path, page: usize, point: Point, inverse: bool, settings: &Settings) -> Result<()> {
    let session = open_session(pdf, settings)?;
    let mapping = session.page_mapping(page)?;

    let mapped = if inverse {
        mapping.to_view(point)
    } else {
        mapping.to_pdf(point)
    };
    println!("{} {}", mapped.x, mapped.y);
    Ok(())
}

fn preview(
    pdf: &Path,
    page: usize,
    out: &Path,
    ink: Option<PathBuf>,
    scale: f64,
    settings: &Settings,
) -> Result<()> {
    if !scale.is_finite() || scale <= 0.0 {
        bail!("scale must be positive, got {}", scale);
    }

    let session = open_session(pdf, settings)?;
    let view_size = session.page_view_size(page)?;

    let ink_path = sidecar_or(pdf, ink);
    let store = InkStore::load_or_default(&ink_path)
        .with_context(|| format!("failed to load strokes from {}", ink_path.display()))?;

    let image = render_ink_preview(store.strokes(page), view_size, scale)
        .with_context(|| format!("failed to render page {}", page))?;
    save_preview(&image, out).with_context(|| format!("failed to write {}", out.display()))?;

    println!(
        "rendered {} strokes ({}x{}) to {}",
        store.strokes(page).len(),
        image.width(),
        image.height(),
        out.display()
    );
    Ok(())
}

fn recent(prune: bool) -> Result<()> {
    let path = StateStore::default_path();
    let mut state =
        StateStore::open(&path).with_context(|| format!("failed to read {}", path.display()))?;

    if prune {
        let forgotten = state.prune_missing();
        state.save()?;
        println!("forgot {} missing documents", forgotten);
    }

    if state.recent().is_empty() {
        println!("no recent documents");
        return Ok(());
    }

    for entry in state.recent().iter() {
        let viewer = state.get(&entry.path).unwrap_or_else(ViewerState::default);
        println!(
            "{}  page {} zoom {:.2}  {}",
            entry.opened.format("%Y-%m-%d %H:%M"),
            viewer.page,
            viewer.zoom,
            entry.path.display()
        );
    }
    Ok(())
}
