#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use reverse_scraper_core::pipeline::PipelineContext;
use reverse_scraper_core::selftest::sample_png;
use reverse_scraper_core::{Config, MemorySession, Workspace};

pub const RESULTS_URL: &str = "https://search.test/results?id=42";
pub const ALL_SIZES_URL: &str = "https://www.google.com/search?tbs=simg&q=all";

/// Encode a blank PNG of the given size
pub fn png(width: u32, height: u32) -> Vec<u8> {
    sample_png(width, height).unwrap()
}

/// Config pointing at `input/` and `output/` under `root`
pub fn config_in(root: &Path) -> Config {
    Config {
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        workers: 2,
        ..Config::default()
    }
}

/// Create the folders of a run under `root`
pub fn workspace_in(root: &Path) -> Workspace {
    let workspace = Workspace {
        input_dir: root.join("input"),
        output_dir: root.join("output"),
        no_match_dir: root.join("output").join("(-) Default Results"),
    };
    fs::create_dir_all(&workspace.input_dir).unwrap();
    fs::create_dir_all(&workspace.no_match_dir).unwrap();
    workspace
}

pub fn context_in(root: &Path, links: usize) -> PipelineContext {
    PipelineContext::new(&Config::default(), &workspace_in(root), links)
}

/// Put a source image of the given size into the input folder
pub fn add_source(input_dir: &Path, name: &str, width: u32, height: u32) -> PathBuf {
    let path = input_dir.join(name);
    fs::write(&path, png(width, height)).unwrap();
    path
}

/// A results page whose "All sizes" link leads to a page listing `links`
/// inside a script
pub fn search_with_links(links: &[&str]) -> MemorySession {
    let results = "<html><body><div class=\"nav\"><a href=\"/search?tbs=simg&amp;q=all\">\
                   <span>All sizes</span></a></div></body></html>";
    let entries: Vec<String> = links
        .iter()
        .map(|link| format!("[\"{}\",300,200]", link))
        .collect();
    let sizes = format!(
        "<html><head><script>var _data = [{}];</script></head><body></body></html>",
        entries.join(",")
    );

    MemorySession::redirecting_to(RESULTS_URL)
        .page(RESULTS_URL, results)
        .page(ALL_SIZES_URL, &sizes)
}

/// Names in a folder, sorted
pub fn names_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
