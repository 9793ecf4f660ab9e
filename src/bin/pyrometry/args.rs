use anyhow::{bail, Result};
use clap::{value_t_or_exit, AppSettings, ArgMatches};
use pyrometry::{
    brightness::DEFAULT_CHOOSE_PERCENTAGE, cli::SubCommand, image::DEFAULT_THRESHOLD,
    polynomial::DEFAULT_DEGREE, temperature::DEFAULT_SHIFT, Aggregation,
};
use pyrometry::{args_parser, opt};
use std::path::PathBuf;

pub struct Args {
    pub grad_name: String,
    pub grad_dir: PathBuf,
    pub debug: bool,
    pub command: Command,
}

pub enum Command {
    Grad(GradArgs),
    Apply(ApplyArgs),
}

pub struct GradArgs {
    pub input_dir: Option<PathBuf>,
    pub overwrite: bool,
    pub degree: usize,
    pub threshold: u8,
    pub choose_percentage: f64,
    pub reference: Option<PathBuf>,
}

pub struct ApplyArgs {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub shift: usize,
    pub aggregation: Aggregation,
    pub threshold: u8,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Args {
    pub fn from_cmd_line() -> Result<Args> {
        let degree = DEFAULT_DEGREE.to_string();
        let threshold = DEFAULT_THRESHOLD.to_string();
        let choose_percentage = DEFAULT_CHOOSE_PERCENTAGE.to_string();
        let shift = DEFAULT_SHIFT.to_string();

        let matches = args_parser!("pyrometry")
            .setting(AppSettings::SubcommandRequiredElseHelp)
            .about("Build brightness-to-temperature graduations and apply them to images.")
            .arg(
                opt!("grad name")
                    .default_value("graduation")
                    .help("Graduation name (file name without the .grad extension)"),
            )
            .arg(
                opt!("grad dir")
                    .default_value("GRADUATION")
                    .help("Directory holding graduation files"),
            )
            .arg(
                opt!("debug")
                    .takes_value(false)
                    .help("Enable debug logging"),
            )
            .subcommand(
                SubCommand::with_name("grad")
                    .about("Fit a graduation from calibration images of the wire.")
                    .arg(
                        opt!("input dir")
                            .help("Calibration image directory (default: the graduation directory)"),
                    )
                    .arg(
                        opt!("overwrite")
                            .takes_value(false)
                            .help("Replace an existing graduation of the same name"),
                    )
                    .arg(
                        opt!("degree")
                            .default_value(&degree)
                            .help("Degree of the graduation polynomial"),
                    )
                    .arg(
                        opt!("threshold")
                            .default_value(&threshold)
                            .help("Intensities below this are background"),
                    )
                    .arg(
                        opt!("choose percentage")
                            .default_value(&choose_percentage)
                            .help("Share of wire rows (centred) used for the brightness statistic"),
                    )
                    .arg(
                        opt!("reference")
                            .help("JSON file with the current-to-temperature polynomial of the wire"),
                    ),
            )
            .subcommand(
                SubCommand::with_name("apply")
                    .about("Convert images to temperature maps with a graduation.")
                    .setting(AppSettings::AllowLeadingHyphen)
                    .arg(
                        opt!("input dir")
                            .default_value("INPUT_IMAGES")
                            .help("Directory of images to convert"),
                    )
                    .arg(
                        opt!("output dir")
                            .default_value("OUTPUT_IMAGES")
                            .help("Directory for the temperature maps"),
                    )
                    .arg(
                        opt!("shift")
                            .default_value(&shift)
                            .help("Half-width of the aggregation window"),
                    )
                    .arg(
                        opt!("aggregation")
                            .default_value("max")
                            .possible_values(&["max", "min", "mean", "median"])
                            .help("Aggregation over the window"),
                    )
                    .arg(
                        opt!("threshold")
                            .default_value(&threshold)
                            .help("Intensities below this are background"),
                    )
                    .arg(opt!("min").help("Temperature mapped to 0 in the output (default: map minimum)"))
                    .arg(opt!("max").help("Temperature mapped to 65535 in the output (default: map maximum)")),
            )
            .get_matches();

        let grad_name = value_t_or_exit!(matches, "grad name", String);
        let grad_dir = value_t_or_exit!(matches, "grad dir", PathBuf);
        let debug = matches.is_present("debug");

        let command = match matches.subcommand() {
            ("grad", Some(sub)) => Command::Grad(GradArgs::from_matches(sub)),
            ("apply", Some(sub)) => Command::Apply(ApplyArgs::from_matches(sub)),
            (name, _) => bail!("unknown command `{}`", name),
        };

        Ok(Args {
            grad_name,
            grad_dir,
            debug,
            command,
        })
    }
}

impl GradArgs {
    fn from_matches(matches: &ArgMatches) -> Self {
        let input_dir = matches.value_of("input dir").map(PathBuf::from);
        let reference = matches.value_of("reference").map(PathBuf::from);

        GradArgs {
            input_dir,
            overwrite: matches.is_present("overwrite"),
            degree: value_t_or_exit!(matches, "degree", usize),
            threshold: value_t_or_exit!(matches, "threshold", u8),
            choose_percentage: value_t_or_exit!(matches, "choose percentage", f64),
            reference,
        }
    }
}

impl ApplyArgs {
    fn from_matches(matches: &ArgMatches) -> Self {
        let min = matches
            .is_present("min")
            .then(|| value_t_or_exit!(matches.value_of("min"), f64));
        let max = matches
            .is_present("max")
            .then(|| value_t_or_exit!(matches.value_of("max"), f64));

        ApplyArgs {
            input_dir: value_t_or_exit!(matches, "input dir", PathBuf),
            output_dir: value_t_or_exit!(matches, "output dir", PathBuf),
            shift: value_t_or_exit!(matches, "shift", usize),
            aggregation: value_t_or_exit!(matches, "aggregation", Aggregation),
            threshold: value_t_or_exit!(matches, "threshold", u8),
            min,
            max,
        }
    }
}
