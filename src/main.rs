//! vm-translator - narrated virtual-to-physical address translation
//!
//! Usage: vm-translator [OPTIONS] <COMMAND>
//!
//! Commands:
//!   translate  Translate one virtual address, step by step
//!   batch      Translate every address in a file, writing physical addresses
//!   demo       Walk through a page fault for a single page
//!   show       Print the page table, frames and disk
//!
//! Without `--init` the reference configuration is used: eight pages, eight
//! frames (two empty) and pages 2, 5, 8 and 9 on disk.

use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use log::{LevelFilter, Log, Metadata, Record};

use vm_translator::io::{read_virtual_addresses, write_results};
use vm_translator::{
    Allocation, DEFAULT_PAGE_SIZE, DEMO_PAGE, EvictedMapping, InitData, PageSize, RandomVictim,
    TranslateError, TranslationResult, Translator, VirtualAddress,
};

#[derive(Parser)]
#[command(name = "vm-translator")]
#[command(about = "Virtual-to-physical address translation with simulated page faults", long_about = None)]
struct Cli {
    /// Init file with page table, disk pages and frame count
    #[arg(long, global = true)]
    init: Option<PathBuf>,

    /// Seed for random frame replacement
    #[arg(long, global = true)]
    seed: Option<u64>,

    /// Invalidate an evicted page's entry instead of leaving it stale
    #[arg(long, global = true)]
    evict_invalidates: bool,

    /// Log translation internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Translate one virtual address (decimal or 0x-prefixed hex)
    Translate {
        address: String,

        /// Page size in bytes, a power of two
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u64,

        /// Invalidate the page's entry before the lookup
        #[arg(long)]
        force_fault: bool,
    },

    /// Translate whitespace-separated addresses from INPUT into OUTPUT (-1 on failure)
    Batch {
        input: PathBuf,
        output: PathBuf,

        /// Page size in bytes, a power of two
        #[arg(short, long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u64,
    },

    /// Page fault walkthrough
    Demo {
        #[arg(long, default_value_t = DEMO_PAGE)]
        page: u64,
    },

    /// Print the page table, frames and disk
    Show,
}

/// Writes log records to stderr
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            eprintln!("[{:<5}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Off
        });
    }
}

const DEMO_STEPS: [&str; 9] = [
    "Step 1: CPU requests a page",
    "Step 2: MMU checks page table",
    "Step 3: Page fault triggered",
    "Step 4: CPU interrupted, fault handler takes over",
    "Step 5: Checking if page is on disk",
    "Step 6: Finding available frame",
    "Step 7: Loading page from disk",
    "Step 8: Updating page table",
    "Step 9: CPU resumes execution",
];

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let init_data = match &cli.init {
        Some(path) => InitData::from_file(path)?,
        None => InitData::reference(),
    };
    let selector = match cli.seed {
        Some(seed) => RandomVictim::seeded(seed),
        None => RandomVictim::new(),
    };
    let evicted_mapping = if cli.evict_invalidates {
        EvictedMapping::Invalidate
    } else {
        EvictedMapping::Retain
    };
    let mut translator = init_data
        .build_translator(selector)
        .with_evicted_mapping(evicted_mapping);

    match &cli.command {
        Command::Translate {
            address,
            page_size,
            force_fault,
        } => run_translate(&mut translator, address, *page_size, *force_fault),
        Command::Batch {
            input,
            output,
            page_size,
        } => run_batch(&mut translator, input, output, *page_size),
        Command::Demo { page } => run_demo(&mut translator, *page),
        Command::Show => {
            print_state(&translator);
            Ok(())
        }
    }
}

fn run_translate(
    translator: &mut Translator,
    input: &str,
    page_size: u64,
    force_fault: bool,
) -> Result<(), Box<dyn Error>> {
    let page_size = PageSize::new(page_size)?;
    let address = VirtualAddress::parse(input, page_size)?;
    let (page_bits, offset_bits) = address.split_binary();

    println!("Virtual Address: {}", input.trim());
    println!("Binary: {}", address.binary());
    println!("Page Size: {}", page_size);
    println!("Split Binary: {} | {}", page_bits, offset_bits);
    println!("  Page Number: {}", address.page);
    println!("  Offset: {}", address.offset);

    let result = translator.translate_address(address, force_fault);

    match &result {
        Ok(translation) => print_translation(translation, page_size),
        Err(TranslateError::SegFault { page }) => {
            println!("Looking up page in page table... PAGE FAULT!");
            println!("The requested page {} is not in physical memory.", page);
            println!("Error: Page {} not found on disk.", page);
            println!("Segmentation Fault");
        }
        Err(_) => {}
    }

    result.map(|_| ()).map_err(Into::into)
}

fn print_translation(translation: &TranslationResult, page_size: PageSize) {
    let page = translation.page_number();
    let frame = translation.frame;

    match &translation.fault {
        None => {
            println!("Looking up page in page table... Found!");
            println!("Found mapping: Page {} -> Frame {}", page, frame);
        }
        Some(fault) => {
            println!("Looking up page in page table... PAGE FAULT!");
            println!("The requested page {} is not in physical memory.", page);
            println!("Found page {} on disk. Loading...", page);
            match fault.allocation {
                Allocation::Free(frame) => println!("Assigned to available frame {}", frame),
                Allocation::Evict { frame, victim } => println!(
                    "All frames occupied. Evicting frame {} (page {})",
                    frame, victim
                ),
            }
            println!("Updated mapping: Page {} -> Frame {}", page, frame);
        }
    }

    let base = frame as u64 * page_size.bytes();
    println!("Physical Address = (Frame x Page Size) + Offset");
    println!(
        "Physical Address = ({} x {}) + {}",
        frame,
        page_size.bytes(),
        translation.offset()
    );
    println!("Physical Address = {} + {}", base, translation.offset());
    println!("Physical Address = {}", translation.physical_address);
    println!(
        "Final Physical Address: {:#X} ({})",
        translation.physical_address, translation.physical_address
    );
}

fn run_batch(
    translator: &mut Translator,
    input: &Path,
    output: &Path,
    page_size: u64,
) -> Result<(), Box<dyn Error>> {
    let addresses = read_virtual_addresses(input)?;
    log::info!("translating {} addresses from {}", addresses.len(), input.display());

    let results = translator.translate_batch(&addresses, page_size);

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let faults = results
        .iter()
        .filter(|r| r.as_ref().is_ok_and(TranslationResult::faulted))
        .count();
    log::info!(
        "{} translated ({} after a page fault), {} failed",
        successes,
        faults,
        results.len() - successes
    );

    write_results(output, &results)?;
    log::info!("results written to {}", output.display());
    Ok(())
}

fn run_demo(translator: &mut Translator, page: u64) -> Result<(), Box<dyn Error>> {
    let resolution = translator.demonstrate_fault(page);

    println!("Page Fault Demo");
    println!("A page fault occurs when the CPU references a page not in physical memory.");
    println!("Demonstrating page fault for Page {}...", page);
    println!("{}", DEMO_STEPS[0]);
    println!("{}", DEMO_STEPS[1]);
    println!("PAGE FAULT DETECTED");
    println!("{}", DEMO_STEPS[2]);
    println!("{}", DEMO_STEPS[3]);
    println!("{}", DEMO_STEPS[4]);

    let resolution = match resolution {
        Ok(resolution) => resolution,
        Err(e) => {
            if matches!(e, TranslateError::SegFault { .. }) {
                println!("Error: Page {} not found on disk!", page);
                println!("Segmentation Fault");
            }
            return Err(e.into());
        }
    };

    println!("Found Page {} on disk!", page);
    println!("{}", DEMO_STEPS[5]);
    match resolution.allocation {
        Allocation::Free(frame) => println!("Found available Frame {}", frame),
        Allocation::Evict { frame, .. } => println!("Selected Frame {} for replacement", frame),
    }
    println!("{}", DEMO_STEPS[6]);
    println!("{}", DEMO_STEPS[7]);
    println!("{}", DEMO_STEPS[8]);
    println!("Page Fault Resolved!");
    println!(
        "Final Mapping: Page {} -> Frame {}",
        resolution.page,
        resolution.frame()
    );
    Ok(())
}

fn print_state(translator: &Translator) {
    println!("Page Table:");
    for entry in translator.page_table().entries() {
        println!("  {}", entry);
    }

    println!("Physical Memory:");
    for frame in translator.frames().frames() {
        println!("  {}", frame);
    }

    println!("Disk Storage:");
    for entry in translator.disk().entries() {
        println!("  Page {}: {}", entry.page, entry.payload);
    }
}
