#![deny(
    rust_2018_idioms,
    unreachable_pub,
    unsafe_code,
    unused_imports,
    unused_mut,
    missing_debug_implementations
)]

use anyhow::Context;
use colored::*;
use hodoki::{
    entity::{Entity, EntitySaver},
    REGISTRY,
};
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::io::Write;
use std::{
    fs::File,
    path::{Component, Path, PathBuf},
};
use structopt::StructOpt;

#[derive(StructOpt, Debug)]
#[structopt()]
struct Opt {
    /// Files to process
    #[structopt(
        name = "FILES",
        parse(from_os_str),
        required_unless = "list-formats"
    )]
    files: Vec<PathBuf>,

    /// Directory to output extracted files
    #[structopt(
        short = "o",
        long = "output",
        parse(from_os_str),
        default_value = "ext/"
    )]
    output_dir: PathBuf,

    /// Decode with this format instead of guessing it
    #[structopt(short, long)]
    format: Option<String>,

    /// Print known format tags and exit
    #[structopt(short, long)]
    list_formats: bool,
}

fn main() {
    env_logger::init();
    let opt = Opt::from_args();

    if opt.list_formats {
        REGISTRY.tags().for_each(|tag| println!("{}", tag));
        return;
    }
    if let Some(tag) = &opt.format {
        if let Err(err) = REGISTRY.get(tag) {
            log::error!("{}", err);
            return;
        }
    }

    let progress_bar = init_progressbar("Extracting...", opt.files.len() as u64);
    let results = opt
        .files
        .par_iter()
        .progress_with(progress_bar)
        .map(|file| (file, extract(&opt, file)))
        .collect::<Vec<_>>();

    let mut extracted = 0;
    let mut failed = 0;
    for (file, result) in results {
        match result {
            Ok(count) => extracted += count,
            Err(err) => {
                failed += 1;
                log::error!("{:?}: {:#}", file, err);
            }
        }
    }
    println!(
        "{} {} files to {:?}",
        "Extracted".green(),
        extracted,
        opt.output_dir
    );
    if failed > 0 {
        println!("{} {} inputs", "Failed".red(), failed);
    }
}

fn extract(opt: &Opt, file: &Path) -> anyhow::Result<usize> {
    let contents = std::fs::read(file)?;
    let name = file
        .file_name()
        .context("Could not get file name")?
        .to_string_lossy()
        .into_owned();
    let mut output_dir = opt.output_dir.clone();
    output_dir.push(file.file_stem().context("Could not get file stem")?);

    let mut entity = Entity::new(name, contents);
    let mut saver = FileSaver::new(output_dir);
    REGISTRY.decode(&mut entity, opt.format.as_deref(), &mut saver)?;
    Ok(saver.count)
}

/// Writes every entity under `root`, keeping its relative path.
#[derive(Debug)]
struct FileSaver {
    root: PathBuf,
    count: usize,
}

impl FileSaver {
    fn new(root: PathBuf) -> Self {
        Self { root, count: 0 }
    }
}

impl EntitySaver for FileSaver {
    fn save(&mut self, entity: Entity) -> anyhow::Result<()> {
        let relative = normalize(entity.name());
        if relative.as_os_str().is_empty() {
            anyhow::bail!("Member name {:?} has no usable path", entity.name());
        }
        let output_file_name = self.root.join(relative);
        std::fs::create_dir_all(
            &output_file_name
                .parent()
                .context("Could not get parent directory")?,
        )?;
        log::debug!("Writing: {:?}", output_file_name);
        File::create(&output_file_name)?.write_all(entity.stream.as_bytes())?;
        self.count += 1;
        Ok(())
    }
}

/// Archive names use either separator and may try to climb out of the
/// output directory; only plain components survive.
fn normalize(name: &str) -> PathBuf {
    Path::new(&name.replace('\\', "/"))
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part),
            _ => None,
        })
        .collect()
}

fn init_progressbar(prefix: &str, size: u64) -> ProgressBar {
    let progress_bar = ProgressBar::new(size).with_style(
        ProgressStyle::default_bar().template(
            " {spinner} {prefix} {wide_bar:} {pos:>6}/{len:6} ETA:[{eta}]",
        ),
    );
    progress_bar.set_prefix(prefix);
    progress_bar
}
