use brle::{Decoder, Encoder, IoSink, Width, Word};
use clap::{ArgAction, Parser};
use log::{debug, info};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::process;

/// Compress or expand binary data using run-length encoding.
///
/// Data is encoded and decoded in a single pass without buffering the input
/// or output, which suits memory-constrained or latency-sensitive use.
#[derive(Parser)]
#[command(name = "brle", version)]
struct Cli {
    /// Encode input (the default)
    #[arg(short, long, action = ArgAction::SetTrue, overrides_with_all = ["encode", "decode"])]
    encode: bool,
    /// Decode input; of several `-e`/`-d` flags the last one wins, e.g. `-eded`
    #[arg(short, long, action = ArgAction::SetTrue, overrides_with_all = ["encode", "decode"])]
    decode: bool,
    /// Word width in bits; words are read and written in native byte order
    #[arg(short, long, default_value_t = Width::W8)]
    width: Width,
    /// Input file, `-` for stdin
    input: PathBuf,
    /// Output file, `-` for stdout
    output: PathBuf,
}

/// Words as they are stored in files.
trait NativeBytes: Word {
    fn from_ne(bytes: &[u8]) -> Self;
    fn write_ne<W: Write>(self, writer: &mut W) -> io::Result<()>;
}

macro_rules! impl_native_bytes {
    ($($ty:ty),*) => {
        $(
            impl NativeBytes for $ty {
                fn from_ne(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$ty>()];
                    raw.copy_from_slice(bytes);
                    <$ty>::from_ne_bytes(raw)
                }

                fn write_ne<W: Write>(self, writer: &mut W) -> io::Result<()> {
                    writer.write_all(&self.to_ne_bytes())
                }
            }
        )*
    };
}

impl_native_bytes!(u8, u16, u32, u64);

/// An I/O error and the operand it happened on, `Input` or `Output`.
type Failure = (&'static str, io::Error);

fn on_input(e: io::Error) -> Failure {
    ("Input", e)
}

fn on_output(e: io::Error) -> Failure {
    ("Output", e)
}

fn open_input(path: &Path) -> io::Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdin().lock()))
    } else {
        Ok(Box::new(File::open(path)?))
    }
}

fn open_output(path: &Path) -> io::Result<Box<dyn Write>> {
    if path.as_os_str() == "-" {
        Ok(Box::new(io::stdout().lock()))
    } else {
        Ok(Box::new(File::create(path)?))
    }
}

/// Fills `word` from `reader`. Returns false on a clean end of input.
fn read_word<R: Read>(reader: &mut R, word: &mut [u8]) -> io::Result<bool> {
    let mut filled = 0;
    while filled < word.len() {
        match reader.read(&mut word[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    match filled {
        0 => Ok(false),
        n if n == word.len() => Ok(true),
        n => Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "input ends with {n} bytes, not a whole {}-byte word",
                word.len()
            ),
        )),
    }
}

fn encode<T: NativeBytes>(input: impl Read, output: impl Write) -> Result<(), Failure> {
    let mut reader = BufReader::new(input);
    let mut sink = IoSink::new(BufWriter::new(output));
    let mut word = vec![0u8; T::BITS as usize / 8];
    let mut words = 0u64;
    {
        let mut encoder = Encoder::<_, T>::new(&mut sink);
        while read_word(&mut reader, &mut word).map_err(on_input)? {
            encoder.push(T::from_ne(&word)).map_err(on_output)?;
            words += 1;
        }
        encoder.flush().map_err(on_output)?;
    }
    debug!("encoded {words} words");
    sink.into_inner().flush().map_err(on_output)
}

fn decode<T: NativeBytes>(input: impl Read, output: impl Write) -> Result<(), Failure> {
    let reader = BufReader::new(input);
    let mut writer = BufWriter::new(output);
    let mut read_error = None;
    let blocks = reader.bytes().map_while(|byte| match byte {
        Ok(byte) => Some(byte),
        Err(e) => {
            read_error = Some(e);
            None
        }
    });
    let mut words = 0u64;
    for word in Decoder::<_, T>::new(blocks) {
        word.write_ne(&mut writer).map_err(on_output)?;
        words += 1;
    }
    if let Some(e) = read_error {
        return Err(on_input(e));
    }
    debug!("decoded {words} words");
    writer.flush().map_err(on_output)
}

fn run(cli: &Cli) -> Result<(), Failure> {
    let input = open_input(&cli.input).map_err(on_input)?;
    let output = open_output(&cli.output).map_err(on_output)?;
    let decoding = cli.decode && !cli.encode;
    info!(
        "{} {} -> {} with {}-bit words",
        if decoding { "decoding" } else { "encoding" },
        cli.input.display(),
        cli.output.display(),
        cli.width
    );
    match (decoding, cli.width) {
        (false, Width::W8) => encode::<u8>(input, output),
        (false, Width::W16) => encode::<u16>(input, output),
        (false, Width::W32) => encode::<u32>(input, output),
        (false, Width::W64) => encode::<u64>(input, output),
        (true, Width::W8) => decode::<u8>(input, output),
        (true, Width::W16) => decode::<u16>(input, output),
        (true, Width::W32) => decode::<u32>(input, output),
        (true, Width::W64) => decode::<u64>(input, output),
    }
}

fn main() {
    pretty_env_logger::init();
    let cli = Cli::parse();

    if let Err((prefix, e)) = run(&cli) {
        eprintln!("{prefix}: {e}");
        process::exit(e.raw_os_error().unwrap_or(1));
    }
}
