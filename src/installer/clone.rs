// src/installer/clone.rs
// Clone stage: clone or refresh the app's git repository.
// Grounded on `clone_application()` in the original source.

use std::path::Path;

use git2::build::RepoBuilder;
use git2::{FetchOptions, Repository};

use crate::bus::{BusEvent, ProgressBus};
use crate::config::AppConfig;
use crate::error::{AppError, AppResult};
use crate::util::sizefmt::{folder_size_kb, verifies_within_tolerance};

pub fn clone_or_refresh(
    app_id: &str,
    config: &AppConfig,
    commit_id: Option<&str>,
    branch_name: &str,
    clone_recursive: bool,
    minimum_app_size_kb: u64,
    verify_tolerance_percent: u32,
    bus: &ProgressBus,
) -> AppResult<()> {
    let app_path = Path::new(&config.app_path);

    if !app_path.exists() {
        clone_fresh(app_id, &config.repo_url, app_path, commit_id, branch_name, clone_recursive, bus)?;
    } else if config.allow_refresh {
        refresh_existing(app_id, app_path, minimum_app_size_kb, verify_tolerance_percent, bus)?;
    } else {
        return Err(AppError::PreconditionFailed(format!(
            "refresh requested for '{app_id}' but allow_refresh is false"
        )));
    }

    Ok(())
}

fn clone_fresh(
    app_id: &str,
    repo_url: &str,
    app_path: &Path,
    commit_id: Option<&str>,
    branch_name: &str,
    clone_recursive: bool,
    bus: &ProgressBus,
) -> AppResult<()> {
    bus.publish(BusEvent::InstallLog {
        app_id: app_id.to_string(),
        log: format!("Cloning repository '{repo_url}' branch '{branch_name}' recursive={clone_recursive} ..."),
    });

    let mut fetch_options = FetchOptions::new();
    let app_id_owned = app_id.to_string();
    let bus_clone = bus.clone();
    let mut callbacks = git2::RemoteCallbacks::new();
    callbacks.transfer_progress(move |progress| {
        let total = progress.total_objects().max(1);
        let received = progress.received_objects();
        let percentage = ((received as f64 / total as f64) * 100.0) as u32;
        bus_clone.publish(BusEvent::InstallProgress {
            app_id: app_id_owned.clone(),
            percentage,
            stage: "Cloning".to_string(),
            speed: None,
            eta: None,
            downloaded: None,
            processed: Some(format!("{received}/{total} objects")),
        });
        true
    });
    fetch_options.remote_callbacks(callbacks);

    // Don't auto-checkout when a specific commit/branch is requested;
    // we check it out explicitly afterwards.
    let skip_default_checkout = commit_id.is_some() || branch_name != "master";

    let mut builder = RepoBuilder::new();
    builder.fetch_options(fetch_options);
    if clone_recursive {
        // Submodules are updated explicitly below; git2 has no single
        // "recursive clone" flag equivalent to GitPython's `recursive=True`.
    }

    let repo = builder.clone(repo_url, app_path)?;

    if !skip_default_checkout {
        // default branch already checked out by clone()
    } else if let Some(commit) = commit_id {
        checkout_commit(&repo, commit)?;
    } else {
        checkout_branch(&repo, branch_name)?;
    }

    if clone_recursive {
        update_submodules_recursive(&repo)?;
    }

    bus.publish(BusEvent::InstallLog {
        app_id: app_id.to_string(),
        log: "Repository cloned successfully.".to_string(),
    });

    Ok(())
}

fn checkout_branch(repo: &Repository, branch_name: &str) -> AppResult<()> {
    let reference = format!("refs/remotes/origin/{branch_name}");
    let (object, reference) = repo.revparse_ext(&reference)?;
    repo.checkout_tree(&object, None)?;
    match reference {
        Some(reference) => repo.set_head(reference.name().unwrap_or(&reference_name_fallback(branch_name)))?,
        None => repo.set_head_detached(object.id())?,
    }
    Ok(())
}

fn reference_name_fallback(branch_name: &str) -> String {
    format!("refs/heads/{branch_name}")
}

fn checkout_commit(repo: &Repository, commit_id: &str) -> AppResult<()> {
    let object = repo.revparse_single(commit_id)?;
    repo.checkout_tree(&object, None)?;
    repo.set_head_detached(object.id())?;
    Ok(())
}

fn update_submodules_recursive(repo: &Repository) -> AppResult<()> {
    for mut submodule in repo.submodules()? {
        submodule.update(true, None)?;
    }
    Ok(())
}

fn refresh_existing(
    app_id: &str,
    app_path: &Path,
    minimum_app_size_kb: u64,
    verify_tolerance_percent: u32,
    bus: &ProgressBus,
) -> AppResult<()> {
    let current_kb = folder_size_kb(app_path);
    if !verifies_within_tolerance(current_kb, minimum_app_size_kb, verify_tolerance_percent) {
        return Err(AppError::SizeVerificationFailed(format!(
            "'{}' measured {current_kb} KiB, expected at least {minimum_app_size_kb} KiB before refresh",
            app_path.display()
        )));
    }

    let repo = Repository::open(app_path)?;
    let mut remote = repo.find_remote("origin")?;
    remote.fetch(&[] as &[&str], None, None)?;

    let head = repo.head()?;
    let branch_name = head
        .shorthand()
        .ok_or_else(|| AppError::GitError("HEAD has no shorthand name".to_string()))?
        .to_string();
    let remote_ref = repo.find_reference(&format!("refs/remotes/origin/{branch_name}"))?;
    let target = remote_ref
        .target()
        .ok_or_else(|| AppError::GitError("remote ref has no target".to_string()))?;

    let object = repo.find_object(target, None)?;
    repo.reset(&object, git2::ResetType::Hard, None)?;

    bus.publish(BusEvent::InstallLog {
        app_id: app_id.to_string(),
        log: format!("'{app_id}' refreshed to latest '{branch_name}'."),
    });

    Ok(())
}
