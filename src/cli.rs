use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "objstream")]
#[command(version)]
#[command(about = "Read byte ranges of objects from HTTP or local object stores", long_about = None)]
#[command(after_help = "Examples:\n  \
  objstream https://example.com/store bucket data.bin         print the whole object\n  \
  objstream -s 4096 -n 512 ./store bucket data.bin           print 512 bytes at offset 4096\n  \
  objstream -r 1048576 --stats https://example.com/store b k  fetch in 1 MiB chunks")]
pub struct Cli {
    /// Store location: HTTP base URL or local directory
    #[arg(value_name = "STORE")]
    pub store: String,

    /// Container (bucket) holding the object
    #[arg(value_name = "CONTAINER")]
    pub container: String,

    /// Object key inside the container
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Start reading at this byte offset
    #[arg(short = 's', long = "offset", value_name = "BYTES", default_value_t = 0)]
    pub offset: i64,

    /// Read exactly this many bytes (default: to the end of the object)
    #[arg(short = 'n', long = "length", value_name = "BYTES")]
    pub length: Option<usize>,

    /// Bytes fetched per request
    #[arg(
        short = 'r',
        long = "readahead",
        value_name = "BYTES",
        env = "OBJSTREAM_READAHEAD"
    )]
    pub readahead: Option<i64>,

    /// Print fetch statistics to stderr
    #[arg(long = "stats")]
    pub stats: bool,

    /// Verbose logging (-vv => trace)
    #[arg(short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode, no messages on stderr
    #[arg(short = 'q')]
    pub quiet: bool,
}

impl Cli {
    pub fn is_http_url(&self) -> bool {
        self.store.starts_with("http://") || self.store.starts_with("https://")
    }

    /// Default log filter for the chosen verbosity
    pub fn log_filter(&self) -> &'static str {
        match (self.quiet, self.verbose) {
            (true, _) => "off",
            (false, 0) => "warn",
            (false, 1) => "debug",
            (false, _) => "trace",
        }
    }
}
