//! End-to-end command workflows
//!
//! Each function here is the body of one CLI command: it wires configuration,
//! session, and the lifecycle modules together. The push workflow owns the
//! scoped working directory for zip parts; the directory is removed on every
//! exit path, success or failure.

use crate::activity;
use crate::archive;
use crate::config::{Config, QualityLevel};
use crate::error::{CliError, Result};
use crate::group;
use crate::repo;
use crate::session::Session;
use crate::staging;
use console::style;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Parameters of one push invocation
#[derive(Debug)]
pub struct PushRequest<'a> {
    /// Repository directory or zip archive to publish
    pub repo: &'a Path,

    /// Target environment name
    pub environment: &'a str,

    /// Product key for profile lookups
    pub product: &'a str,

    /// Product version for repository metadata
    pub version: &'a str,

    /// Destination quality level
    pub quality: QualityLevel,
}

/// Push repository content through the full staging lifecycle:
/// partition → start → upload → finish → verify(close) → promotion chain.
pub fn run_push(config: &Config, request: &PushRequest<'_>, debug: bool) -> Result<()> {
    let environment = config.environment(request.environment)?;
    let session = Session::new(environment, request.environment, debug)?;

    println!(
        "Pushing {} content to {}",
        request.repo.display(),
        request.environment
    );

    // Scoped working directory: dropped (and deleted) on every exit path.
    let parts_dir = tempfile::tempdir().map_err(|e| CliError::Dir {
        path: std::env::temp_dir(),
        reason: e.to_string(),
    })?;

    println!("Creating zip archives in {}", parts_dir.path().display());
    let zip_paths = partition_source(request.repo, parts_dir.path(), config)?;

    let staging_repo_id = staging::start_staging_repo(
        &session,
        config,
        request.product,
        request.version,
        request.quality,
    )?;
    println!("Opened staging repository {staging_repo_id}");

    // The first part replaces whatever an earlier attempt may have uploaded.
    for (index, zip_path) in zip_paths.iter().enumerate() {
        println!(
            "  {} Uploading part {}/{}",
            style("→").cyan(),
            index + 1,
            zip_paths.len()
        );
        repo::push_zip(&session, &staging_repo_id, zip_path, index == 0)?;
    }

    staging::finish_staging_repo(
        &session,
        config,
        &staging_repo_id,
        request.product,
        request.version,
        request.quality,
    )?;

    if activity::verify_action(&session, &staging_repo_id, "close", &config.polling)? {
        return Err(CliError::VerificationFailed {
            action: "close".to_string(),
            repository: staging_repo_id,
        });
    }
    println!("{} Staging repository closed", style("✓").green());

    let profiles = config.promote_profile_ids(request.product, request.quality)?;
    if profiles.is_empty() {
        println!("No promotion profiles configured; leaving staging repository closed");
    }
    let mut previous: Option<String> = None;
    for profile in profiles {
        // The first hop promotes the staging repository itself; every later
        // hop promotes the group the previous promotion created. The server's
        // activity log is the source of truth for that linkage.
        let entity = match previous {
            None => staging_repo_id.clone(),
            Some(prev) => activity::resolve_promotion_target(&session, &prev)?,
        };

        println!("Promoting {entity} through profile {profile}");
        staging::promote(
            &session,
            profile,
            &entity,
            request.product,
            request.version,
            request.quality,
        )?;

        if activity::verify_action(&session, &entity, "promote", &config.polling)? {
            return Err(CliError::VerificationFailed {
                action: "promote".to_string(),
                repository: entity,
            });
        }
        previous = Some(entity);
    }

    println!("{} Push complete", style("✓").green());
    Ok(())
}

fn partition_source(
    source: &Path,
    out_dir: &Path,
    config: &Config,
) -> Result<Vec<std::path::PathBuf>> {
    let bounds = &config.partition;
    if source.is_dir() {
        println!("Processing repository directory: {}", source.display());
        archive::create_partitioned_zips_from_dir(source, out_dir, bounds.max_count, bounds.max_size)
    } else if is_zip_file(source) {
        println!("Processing repository zip archive: {}", source.display());
        archive::create_partitioned_zips_from_zip(source, out_dir, bounds.max_count, bounds.max_size)
    } else {
        Err(CliError::InvalidTarget {
            path: source.to_path_buf(),
        })
    }
}

/// A zip file starts with the `PK` local-file-header magic
fn is_zip_file(path: &Path) -> bool {
    if !path.is_file() {
        return false;
    }
    let mut magic = [0u8; 4];
    match File::open(path).and_then(|mut f| f.read_exact(&mut magic)) {
        Ok(()) => magic == [0x50, 0x4b, 0x03, 0x04],
        Err(_) => false,
    }
}

/// Drop a staging repository, reporting server-side rejections
pub fn run_rollback(
    config: &Config,
    environment_name: &str,
    staging_repo_id: &str,
    debug: bool,
) -> Result<()> {
    let environment = config.environment(environment_name)?;
    let session = Session::new(environment, environment_name, debug)?;

    println!("Dropping staging repository {staging_repo_id}");
    if staging::drop_staging_repo(&session, staging_repo_id)? {
        println!("{} Dropped {staging_repo_id}", style("✓").green());
        Ok(())
    } else {
        Err(CliError::DropFailed {
            repository: staging_repo_id.to_string(),
        })
    }
}

/// Add a repository to a content group (legacy membership mode)
pub fn run_group_add(
    config: &Config,
    environment_name: &str,
    group_key: &str,
    repo_key: &str,
    debug: bool,
) -> Result<()> {
    let environment = config.environment(environment_name)?;
    let session = Session::new(environment, environment_name, debug)?;

    let Some(mut group) = group::load(&session, group_key)? else {
        return Err(CliError::GroupNotFound {
            group: group_key.to_string(),
        });
    };

    println!("Adding {repo_key} to group {group_key}");
    group.append_member(&session, repo_key)?;
    group.save(&session)?;
    Ok(())
}

/// Remove a repository from a content group (legacy membership mode)
pub fn run_group_remove(
    config: &Config,
    environment_name: &str,
    group_key: &str,
    repo_key: &str,
    debug: bool,
) -> Result<()> {
    let environment = config.environment(environment_name)?;
    let session = Session::new(environment, environment_name, debug)?;

    let Some(mut group) = group::load(&session, group_key)? else {
        return Err(CliError::GroupNotFound {
            group: group_key.to_string(),
        });
    };

    println!("Removing {repo_key} from group {group_key}");
    group.remove_member(repo_key);
    group.save(&session)?;
    Ok(())
}

/// Print the product → profile-id table
pub fn run_list_products(config: &Config) {
    println!(
        "{}",
        style(format!("{:<20}{:<20}{:<20}", "Product", "EA", "GA")).bold()
    );
    for (key, product) in &config.products {
        println!(
            "{:<20}{:<20}{:<20}",
            key,
            product.ea.as_deref().unwrap_or("-"),
            product.ga.as_deref().unwrap_or("-"),
        );
    }
}

/// Write a starter configuration file
pub fn run_init() -> Result<()> {
    let path = crate::config::init_config()?;
    println!("Wrote starter config to: {}\n", path.display());
    println!("Next steps:\n");
    println!("  - Set each environment's url and credentials.");
    println!("  - Add a [products.<KEY>] section per product with its profile ids.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn zip_magic_is_detected() {
        let dir = tempdir().expect("tempdir");

        let zip_path = dir.path().join("content.zip");
        let file = File::create(&zip_path).expect("create");
        let mut writer = zip::ZipWriter::new(file);
        writer
            .start_file("a.txt", zip::write::SimpleFileOptions::default())
            .expect("entry");
        writer.write_all(b"hello").expect("write");
        writer.finish().expect("finish");
        assert!(is_zip_file(&zip_path));

        let text_path = dir.path().join("notes.txt");
        std::fs::write(&text_path, "not an archive").expect("write text");
        assert!(!is_zip_file(&text_path));

        assert!(!is_zip_file(dir.path()));
    }

    #[test]
    fn invalid_source_is_a_configuration_error() {
        let dir = tempdir().expect("tempdir");
        let bogus = dir.path().join("bogus.bin");
        std::fs::write(&bogus, "plain text").expect("write");

        let config = Config::default();
        let out = tempdir().expect("out dir");
        let err = partition_source(&bogus, out.path(), &config).expect_err("rejected");
        assert!(matches!(err, CliError::InvalidTarget { .. }));
        assert_eq!(err.exit_code(), 2);
    }
}
