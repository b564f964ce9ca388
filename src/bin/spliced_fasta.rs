use std::process::ExitCode;
use std::sync::Arc;

use camino::Utf8PathBuf;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use spliced_fasta::app::{ExportOptions, Exporter};
use spliced_fasta::config::{
    ConfigLoader, DEFAULT_BIOTYPE, DbSettings, DnaSource, RestSettings, Settings,
};
use spliced_fasta::domain::UnstrandedPolicy;
use spliced_fasta::ensembl::{EnsemblCoreStore, EnsemblDb, EnsemblDnaStore};
use spliced_fasta::error::ExportError;
use spliced_fasta::fasta::FastaWriter;
use spliced_fasta::output::{JsonOutput, OutputSink};
use spliced_fasta::rest::EnsemblRestSequenceStore;
use spliced_fasta::store::SequenceStore;

#[derive(Parser)]
#[command(name = "spliced-fasta")]
#[command(about = "Export spliced transcript sequences with optional genomic flanks as FASTA")]
#[command(version, author)]
struct Cli {
    #[arg(long, help = "JSON file with \"core\", \"dna\" and \"rest\" connection settings")]
    config: Option<Utf8PathBuf>,

    #[arg(long, help = "Annotation database host")]
    host: Option<String>,

    #[arg(long, help = "Annotation database port [default: 3306]")]
    port: Option<u16>,

    #[arg(long)]
    user: Option<String>,

    #[arg(long = "pass", alias = "password", env = "ENSEMBL_DB_PASS", hide_env_values = true)]
    password: Option<String>,

    #[arg(long)]
    dbname: Option<String>,

    #[arg(long, help = "Separate sequence database host")]
    dnahost: Option<String>,

    #[arg(long)]
    dnaport: Option<u16>,

    #[arg(long)]
    dnauser: Option<String>,

    #[arg(long, env = "ENSEMBL_DNA_DB_PASS", hide_env_values = true)]
    dnadbpass: Option<String>,

    #[arg(long)]
    dnadbname: Option<String>,

    #[arg(long, help = "Fetch genomic sequence from an Ensembl REST server")]
    dna_rest_url: Option<String>,

    #[arg(long, help = "Species name for the REST sequence backend, e.g. homo_sapiens")]
    species: Option<String>,

    #[arg(long, alias = "output_file", help = "Write FASTA here instead of standard output")]
    output_file: Option<Utf8PathBuf>,

    #[arg(long, default_value = DEFAULT_BIOTYPE)]
    biotype: String,

    #[arg(long, alias = "flanking_length", default_value_t = 0)]
    flanking_length: u32,

    #[arg(
        long,
        value_enum,
        default_value_t = UnstrandedPolicy::default(),
        help = "Orientation used for transcripts with strand 0"
    )]
    unstranded: UnstrandedPolicy,

    #[arg(long, help = "Print a JSON summary of the export to standard error")]
    summary_json: bool,
}

impl Cli {
    fn settings(&self) -> Settings {
        Settings {
            core: DbSettings {
                host: self.host.clone(),
                port: self.port,
                user: self.user.clone(),
                password: self.password.clone(),
                dbname: self.dbname.clone(),
            },
            dna: DbSettings {
                host: self.dnahost.clone(),
                port: self.dnaport,
                user: self.dnauser.clone(),
                password: self.dnadbpass.clone(),
                dbname: self.dnadbname.clone(),
            },
            rest: RestSettings {
                url: self.dna_rest_url.clone(),
                species: self.species.clone(),
            },
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(err) = report.downcast_ref::<ExportError>() {
            return ExitCode::from(err.exit_code());
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.biotype.trim().is_empty() {
        let err = ExportError::InvalidConfig("--biotype must not be empty".to_string());
        return Err(err.into());
    }
    let resolved = ConfigLoader::resolve(cli.config.as_deref(), cli.settings())?;

    let core = Arc::new(EnsemblDb::connect("core", &resolved.core)?);
    let dna: Arc<dyn SequenceStore> = match &resolved.dna {
        DnaSource::Core => Arc::new(EnsemblDnaStore::new(Arc::clone(&core))),
        DnaSource::Database(config) => {
            Arc::new(EnsemblDnaStore::new(Arc::new(EnsemblDb::connect("dna", config)?)))
        }
        DnaSource::Rest { url, species } => {
            tracing::info!(%url, %species, "reading sequence from REST server");
            Arc::new(EnsemblRestSequenceStore::new(url, species)?)
        }
    };

    let options = ExportOptions {
        biotype: cli.biotype.clone(),
        flank_length: cli.flanking_length,
        unstranded: cli.unstranded,
    };
    let exporter = Exporter::new(
        EnsemblCoreStore::new(core, Arc::clone(&dna)),
        dna,
        options,
    );

    let sink = OutputSink::open(cli.output_file.as_deref())?;
    let destination = sink.describe();
    let mut writer = FastaWriter::new(sink);
    let summary = exporter.run(&mut writer)?;
    writer
        .finish()
        .map_err(|err| ExportError::Output(err.to_string()))?;

    tracing::info!(
        biotype = %summary.biotype,
        records = summary.records,
        bases = summary.bases,
        destination,
        "export finished"
    );
    if cli.summary_json {
        JsonOutput::print_summary(&summary)
            .map_err(|err| ExportError::Output(err.to_string()))?;
    }
    Ok(())
}
