//! Repository content partitioning
//!
//! Repackages a repository directory tree or an existing zip archive into a
//! bounded sequence of zip parts for upload. Each part holds at most
//! `max_count` entries and stays under `max_size` cumulative uncompressed
//! bytes; a new part is started whenever appending the next entry would
//! violate either bound.

use crate::error::{CliError, Result};
use std::fs::File;
use std::io::{self, BufReader, Read, Seek};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Name of the subdirectory that holds the actual repository content inside
/// a product deliverable archive (`<top-level>/maven-repository/...`)
const REPOSITORY_SUBDIR: &str = "maven-repository";

/// Walk a repository directory and produce partitioned zip parts in `out_dir`.
///
/// Entry names are paths relative to `src`. Returns the lexicographically
/// sorted list of produced part paths; callers upload in exactly this order.
pub fn create_partitioned_zips_from_dir(
    src: &Path,
    out_dir: &Path,
    max_count: usize,
    max_size: u64,
) -> Result<Vec<PathBuf>> {
    let mut zipper = Zipper::new(out_dir, max_count, max_size);

    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let rel = path.strip_prefix(src).map_err(|e| CliError::Internal(format!(
            "walked path {} escapes source root: {e}",
            path.display()
        )))?;
        let name = entry_name(rel);
        let size = entry.metadata()?.len();

        let file = File::open(path).map_err(|e| CliError::File {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        zipper.append(&name, size, &mut BufReader::new(file))?;
    }

    zipper.finish()
}

/// Repackage an existing zip archive into partitioned zip parts in `out_dir`.
///
/// Product deliverable archives usually look like
///
/// ```text
/// foo-1.0-maven-repository/
/// foo-1.0-maven-repository/examples/
/// foo-1.0-maven-repository/maven-repository/...
/// foo-1.0-maven-repository/licenses/
/// ```
///
/// When a `maven-repository` subdirectory exists one level below the
/// archive's top-level directory, only its content is repackaged, with the
/// `<top-level>/maven-repository/` prefix stripped; everything outside it is
/// discarded. Without such a subdirectory all file entries are taken
/// verbatim. Directory placeholder entries are never copied.
pub fn create_partitioned_zips_from_zip(
    src: &Path,
    out_dir: &Path,
    max_count: usize,
    max_size: u64,
) -> Result<Vec<PathBuf>> {
    let file = File::open(src).map_err(|e| CliError::File {
        path: src.to_path_buf(),
        reason: e.to_string(),
    })?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;
    let repodir = find_repository_subdir(&mut archive)?;

    let mut zipper = Zipper::new(out_dir, max_count, max_size);
    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        if name.ends_with('/') && entry.size() == 0 {
            continue;
        }

        let target = match &repodir {
            Some(prefix) => match name.strip_prefix(prefix.as_str()) {
                Some(stripped) => stripped.to_string(),
                // Outside the repository subdirectory; not part of the
                // publishable content.
                None => continue,
            },
            None => name,
        };

        let size = entry.size();
        zipper.append(&target, size, &mut entry)?;
    }

    zipper.finish()
}

/// Locate a `<top-level>/maven-repository/` subdirectory among the archive
/// entries, returning its prefix (with trailing separator) when present
fn find_repository_subdir<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Option<String>> {
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        let mut parts = entry.name().split('/');
        let (top, second, rest) = (parts.next(), parts.next(), parts.next());
        if let (Some(top), Some(second), Some(_)) = (top, second, rest) {
            if second == REPOSITORY_SUBDIR {
                return Ok(Some(format!("{top}/{second}/")));
            }
        }
    }
    Ok(None)
}

/// Join path components with `/` regardless of platform separator
fn entry_name(rel: &Path) -> String {
    rel.iter()
        .map(|component| component.to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Streaming writer that spreads entries across zip parts, rolling over to a
/// new part whenever the count or size bound would be violated
struct Zipper {
    out_dir: PathBuf,
    max_count: usize,
    max_size: u64,
    entry_count: usize,
    content_size: u64,
    counter: usize,
    writer: Option<ZipWriter<File>>,
    produced: Vec<PathBuf>,
}

impl Zipper {
    fn new(out_dir: &Path, max_count: usize, max_size: u64) -> Self {
        Self {
            out_dir: out_dir.to_path_buf(),
            max_count,
            max_size,
            entry_count: 0,
            content_size: 0,
            counter: 0,
            writer: None,
            produced: Vec::new(),
        }
    }

    fn should_rollover(&self, next_size: u64) -> bool {
        self.writer.is_none()
            || self.entry_count >= self.max_count
            || self.content_size + next_size >= self.max_size
    }

    fn rollover(&mut self) -> Result<()> {
        if let Some(writer) = self.writer.take() {
            writer.finish()?;
            self.counter += 1;
            self.entry_count = 0;
            self.content_size = 0;
        }

        let path = self.out_dir.join(format!("part-{:03}.zip", self.counter));
        let file = File::create(&path).map_err(|e| CliError::File {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        self.writer = Some(ZipWriter::new(file));
        self.produced.push(path);
        Ok(())
    }

    fn append(&mut self, name: &str, size: u64, content: &mut dyn Read) -> Result<()> {
        if self.should_rollover(size) {
            self.rollover()?;
        }

        let Some(writer) = self.writer.as_mut() else {
            return Err(CliError::Internal("no open output archive".to_string()));
        };
        writer.start_file(name, SimpleFileOptions::default())?;
        io::copy(content, writer)?;

        self.entry_count += 1;
        self.content_size += size;
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<PathBuf>> {
        if let Some(writer) = self.writer.take() {
            writer.finish()?;
        }

        // Sorted order is part of the contract: callers upload parts in
        // exactly this sequence.
        let mut produced = self.produced;
        produced.sort();
        Ok(produced)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::tempdir;

    const PATHS: [&str; 3] = ["path/one.txt", "path/to/two.txt", "path/to/stuff/three.txt"];
    const CONTENT: &[u8] = b"This is a test of the system";

    fn write_tree(root: &Path, paths: &[&str]) {
        for path in paths {
            let full = root.join(path);
            fs::create_dir_all(full.parent().expect("has parent")).expect("mkdir");
            fs::write(full, CONTENT).expect("write file");
        }
    }

    fn write_source_zip(path: &Path, entries: &[&str], dirs: &[&str]) {
        let file = File::create(path).expect("create zip");
        let mut writer = ZipWriter::new(file);
        for dir in dirs {
            writer
                .add_directory(*dir, SimpleFileOptions::default())
                .expect("add dir");
        }
        for entry in entries {
            writer
                .start_file(*entry, SimpleFileOptions::default())
                .expect("start entry");
            writer.write_all(CONTENT).expect("write entry");
        }
        writer.finish().expect("finish zip");
    }

    fn entry_names(zip_path: &Path) -> Vec<String> {
        let file = File::open(zip_path).expect("open part");
        let archive = ZipArchive::new(BufReader::new(file)).expect("read part");
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        names
    }

    fn sorted(paths: &[&str]) -> Vec<String> {
        let mut out: Vec<String> = paths.iter().map(|p| (*p).to_string()).collect();
        out.sort();
        out
    }

    #[test]
    fn small_directory_yields_single_part() {
        let src = tempdir().expect("src dir");
        let out = tempdir().expect("out dir");
        write_tree(src.path(), &PATHS);

        let parts =
            create_partitioned_zips_from_dir(src.path(), out.path(), 1000, 1_000_000_000)
                .expect("partition");

        assert_eq!(parts.len(), 1);
        assert_eq!(entry_names(&parts[0]), sorted(&PATHS));
    }

    #[test]
    fn count_rollover_splits_in_traversal_order() {
        let src = tempdir().expect("src dir");
        let out = tempdir().expect("out dir");
        write_tree(src.path(), &PATHS);

        let parts = create_partitioned_zips_from_dir(src.path(), out.path(), 2, 1_000_000_000)
            .expect("partition");

        assert_eq!(parts.len(), 2);
        // Sorted traversal puts the lexicographically first two entries in
        // the first part.
        assert_eq!(
            entry_names(&parts[0]),
            vec!["path/one.txt", "path/to/stuff/three.txt"]
        );
        assert_eq!(entry_names(&parts[1]), vec!["path/to/two.txt"]);
    }

    #[test]
    fn size_rollover_splits_two_then_one() {
        let src = tempdir().expect("src dir");
        let out = tempdir().expect("out dir");
        write_tree(src.path(), &PATHS);

        let max_size = 2 * CONTENT.len() as u64 + 1;
        let parts = create_partitioned_zips_from_dir(src.path(), out.path(), 1000, max_size)
            .expect("partition");

        assert_eq!(parts.len(), 2);
        assert_eq!(entry_names(&parts[0]).len(), 2);
        assert_eq!(entry_names(&parts[1]).len(), 1);
    }

    #[test]
    fn zip_source_is_taken_verbatim_without_repository_subdir() {
        let out = tempdir().expect("out dir");
        let src = tempdir().expect("src holder");
        let src_zip = src.path().join("source.zip");
        write_source_zip(&src_zip, &PATHS, &[]);

        let parts = create_partitioned_zips_from_zip(&src_zip, out.path(), 1000, 1_000_000_000)
            .expect("partition");

        assert_eq!(parts.len(), 1);
        assert_eq!(entry_names(&parts[0]), sorted(&PATHS));
    }

    #[test]
    fn zip_source_strips_repository_prefix() {
        let out = tempdir().expect("out dir");
        let src = tempdir().expect("src holder");
        let src_zip = src.path().join("source.zip");
        let prefixed: Vec<String> = PATHS
            .iter()
            .map(|p| format!("top-level/maven-repository/{p}"))
            .collect();
        let prefixed_refs: Vec<&str> = prefixed.iter().map(String::as_str).collect();
        write_source_zip(&src_zip, &prefixed_refs, &["top-level/maven-repository"]);

        let parts = create_partitioned_zips_from_zip(&src_zip, out.path(), 1000, 1_000_000_000)
            .expect("partition");

        // Stripping yields the same entry names as an archive that never had
        // the prefix.
        assert_eq!(parts.len(), 1);
        assert_eq!(entry_names(&parts[0]), sorted(&PATHS));
    }

    #[test]
    fn zip_source_drops_entries_outside_repository_subdir() {
        let out = tempdir().expect("out dir");
        let src = tempdir().expect("src holder");
        let src_zip = src.path().join("source.zip");
        write_source_zip(
            &src_zip,
            &[
                "top-level/maven-repository/path/one.txt",
                "top-level/example-config.xml",
                "top-level/licenses/license.txt",
            ],
            &["top-level", "top-level/maven-repository"],
        );

        let parts = create_partitioned_zips_from_zip(&src_zip, out.path(), 1000, 1_000_000_000)
            .expect("partition");

        assert_eq!(parts.len(), 1);
        assert_eq!(entry_names(&parts[0]), vec!["path/one.txt"]);
    }

    #[test]
    fn directory_entries_are_never_copied() {
        let out = tempdir().expect("out dir");
        let src = tempdir().expect("src holder");
        let src_zip = src.path().join("source.zip");
        write_source_zip(&src_zip, &["path/one.txt"], &["path", "path/to"]);

        let parts = create_partitioned_zips_from_zip(&src_zip, out.path(), 1000, 1_000_000_000)
            .expect("partition");

        assert_eq!(entry_names(&parts[0]), vec!["path/one.txt"]);
    }

    #[test]
    fn bounds_hold_and_coverage_is_exact() {
        let src = tempdir().expect("src dir");
        let out = tempdir().expect("out dir");
        let inputs: Vec<String> = (0..10).map(|i| format!("dir{i}/file{i}.txt")).collect();
        let input_refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        write_tree(src.path(), &input_refs);

        let parts = create_partitioned_zips_from_dir(src.path(), out.path(), 3, 1_000_000_000)
            .expect("partition");

        let mut all: Vec<String> = Vec::new();
        for part in &parts {
            let names = entry_names(part);
            assert!(names.len() <= 3, "partition exceeds max_count");
            all.extend(names);
        }
        all.sort();
        assert_eq!(all, sorted(&input_refs), "entries dropped or duplicated");
    }

    #[test]
    fn produced_paths_are_sorted_and_numbered() {
        let src = tempdir().expect("src dir");
        let out = tempdir().expect("out dir");
        write_tree(src.path(), &PATHS);

        let parts = create_partitioned_zips_from_dir(src.path(), out.path(), 1, 1_000_000_000)
            .expect("partition");

        assert_eq!(parts.len(), 3);
        let mut expected = parts.clone();
        expected.sort();
        assert_eq!(parts, expected);
        let names: Vec<String> = parts
            .iter()
            .filter_map(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
            .collect();
        assert_eq!(names, vec!["part-000.zip", "part-001.zip", "part-002.zip"]);
    }
}
