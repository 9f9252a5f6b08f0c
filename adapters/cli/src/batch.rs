use std::{
    fs::{self, File},
    io::BufWriter,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::{Context, Result};
use lazor_rendering::{ReportFormat, ReportSink, SolutionReport, WriterSink};
use lazor_system_placement_search::{PlacementSearch, SearchRequest};

const PUZZLE_EXTENSION: &str = "bff";

/// Expands the command-line paths into the puzzle files to solve.
///
/// Files are kept in the order given; directories contribute their `.bff`
/// files sorted by name.
pub(crate) fn collect_puzzles(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut puzzles = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found = Vec::new();
            let entries = fs::read_dir(path)
                .with_context(|| format!("failed to list puzzle directory {}", path.display()))?;
            for entry in entries {
                let entry = entry
                    .with_context(|| format!("failed to list puzzle directory {}", path.display()))?;
                let candidate = entry.path();
                if candidate.is_file()
                    && candidate
                        .extension()
                        .is_some_and(|extension| extension == PUZZLE_EXTENSION)
                {
                    found.push(candidate);
                }
            }
            found.sort();
            log::debug!("{} holds {} puzzles", path.display(), found.len());
            puzzles.extend(found);
        } else {
            puzzles.push(path.clone());
        }
    }
    Ok(puzzles)
}

/// Name a puzzle is reported under.
pub(crate) fn puzzle_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Loads and solves a single puzzle file.
pub(crate) fn solve_file(path: &Path, search: &PlacementSearch) -> Result<SolutionReport> {
    let puzzle = lazor_bff::load_puzzle(path)?;
    let request = SearchRequest::from_puzzle(&puzzle);

    let started = Instant::now();
    let outcome = search.solve(&request);
    let elapsed = started.elapsed();

    Ok(SolutionReport::new(
        puzzle_name(path),
        &puzzle,
        &outcome,
        elapsed,
    ))
}

/// Writes `<name>_solution.txt`, `<name>_solution.json` and
/// `<name>_solution.png` into `directory`.
pub(crate) fn write_report_files(directory: &Path, report: &SolutionReport) -> Result<()> {
    fs::create_dir_all(directory)
        .with_context(|| format!("failed to create output directory {}", directory.display()))?;

    for format in [ReportFormat::Text, ReportFormat::Json] {
        let path = directory.join(format!(
            "{}_solution.{}",
            report.puzzle,
            format.extension()
        ));
        let file = File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        WriterSink::new(BufWriter::new(file), format).emit(report)?;
        log::debug!("wrote {}", path.display());
    }

    let path = directory.join(format!("{}_solution.png", report.puzzle));
    let png = report
        .to_png()
        .with_context(|| format!("failed to draw {}", report.puzzle))?;
    fs::write(&path, png).with_context(|| format!("failed to write {}", path.display()))?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn puzzles_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../puzzles")
    }

    #[test]
    fn directories_expand_to_sorted_bff_files() {
        let puzzles = collect_puzzles(&[puzzles_dir()]).expect("directory lists");
        let names: Vec<String> = puzzles.iter().map(|path| puzzle_name(path)).collect();

        assert_eq!(names, vec!["mad_1", "tiny_5", "unreachable_3"]);
    }

    #[test]
    fn files_are_kept_in_the_given_order() {
        let paths = vec![
            puzzles_dir().join("tiny_5.bff"),
            puzzles_dir().join("mad_1.bff"),
        ];
        assert_eq!(collect_puzzles(&paths).expect("files pass through"), paths);
    }

    #[test]
    fn missing_puzzles_fail_with_the_path() {
        let error = solve_file(
            &puzzles_dir().join("absent.bff"),
            &PlacementSearch::default(),
        )
        .expect_err("file does not exist");

        assert!(format!("{error:#}").contains("absent.bff"));
    }
}
