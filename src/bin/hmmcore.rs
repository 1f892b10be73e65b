use clap::{value_t, App, Arg, ArgMatches, SubCommand};
use hmmcore::error::Result;
use hmmcore::{HmmEngine, MarkovScorer, ModelConfig, ModelParameters, ProbabilityModel};
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;
use rayon::prelude::*;
use std::io::{BufRead, BufReader, BufWriter, Write};
#[macro_use]
extern crate log;

fn common_args<'a, 'b>(sub: App<'a, 'b>) -> App<'a, 'b> {
    sub.version("0.1")
        .author("Bansho Masutani")
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("model")
                .long("model")
                .short("m")
                .value_name("JSON")
                .takes_value(true)
                .required(true)
                .help("Model parameters. JSON format."),
        )
        .arg(
            Arg::with_name("tolerance")
                .long("tolerance")
                .takes_value(true)
                .help("Tolerance of the sum of each distribution. [default: 1e-2 for chains, 1e-5 for HMMs]"),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .default_value("1")
                .help("Number of threads"),
        )
}

fn input_arg() -> Arg<'static, 'static> {
    Arg::with_name("input")
        .long("input")
        .short("i")
        .value_name("TXT")
        .takes_value(true)
        .help("Sequences, one per line, one label per character. Read from stdin if not given.")
}

fn subcommand_score() -> App<'static, 'static> {
    let sub = SubCommand::with_name("score")
        .about("Log-likelihood of each state sequence under a Markov chain.")
        .arg(input_arg());
    common_args(sub)
}

fn subcommand_simulate() -> App<'static, 'static> {
    let sub = SubCommand::with_name("simulate")
        .about("Simulate hidden states and observations from an HMM.")
        .arg(
            Arg::with_name("length")
                .long("length")
                .short("l")
                .takes_value(true)
                .default_value("100")
                .help("Number of steps."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("32389")
                .help("Seed"),
        )
        .arg(
            Arg::with_name("decode")
                .long("decode")
                .help("Also print the Viterbi prediction against the true states."),
        );
    common_args(sub)
}

fn subcommand_viterbi() -> App<'static, 'static> {
    let sub = SubCommand::with_name("viterbi")
        .about("Most likely hidden states for each observation sequence.")
        .arg(input_arg());
    common_args(sub)
}

fn subcommand_posterior() -> App<'static, 'static> {
    let sub = SubCommand::with_name("posterior")
        .about("Posterior probability of each hidden state at each position.")
        .arg(input_arg());
    common_args(sub)
}

fn read_model(matches: &ArgMatches) -> Result<ProbabilityModel> {
    let path = matches.value_of("model").unwrap_or_default();
    let rdr = std::fs::File::open(path).map(BufReader::new)?;
    let params: ModelParameters = serde_json::from_reader(rdr)?;
    let config = match params.emission {
        Some(_) => ModelConfig::hmm(),
        None => ModelConfig::chain(),
    };
    let config = match matches.value_of("tolerance") {
        Some(_) => config.with_tolerance(value_t!(matches, "tolerance", f64).unwrap_or_else(|e| e.exit())),
        None => config,
    };
    let model = ProbabilityModel::new(&params, &config)?;
    debug!("{}", model);
    Ok(model)
}

fn read_lines(matches: &ArgMatches) -> Result<Vec<String>> {
    let stdin = std::io::stdin();
    let reader: Box<dyn BufRead> = match matches.value_of("input") {
        Some(file) => std::fs::File::open(file).map(BufReader::new).map(Box::new)?,
        None => Box::new(BufReader::new(stdin.lock())),
    };
    let mut lines = vec![];
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            lines.push(line.to_string());
        }
    }
    debug!("Read {} sequences", lines.len());
    Ok(lines)
}

// Concatenate single-character labels, and separate longer ones by spaces.
fn render(labels: &[&str]) -> String {
    if labels.iter().all(|x| x.chars().count() == 1) {
        labels.concat()
    } else {
        labels.join(" ")
    }
}

// Lay out true states, a match bar, and predicted states in shared columns.
// Each column is as wide as the wider of its two labels.
fn align_decoded(truth: &[&str], predicted: &[&str]) -> (String, String, String) {
    let single = truth
        .iter()
        .chain(predicted.iter())
        .all(|x| x.chars().count() == 1);
    let sep = if single { "" } else { " " };
    let (mut states, mut bar, mut predictions) = (vec![], vec![], vec![]);
    for (x, y) in truth.iter().zip(predicted.iter()) {
        let width = x.chars().count().max(y.chars().count());
        let mark = if x == y { "|" } else { " " };
        states.push(format!("{:<width$}", x, width = width));
        bar.push(mark.repeat(width));
        predictions.push(format!("{:<width$}", y, width = width));
    }
    (states.join(sep), bar.join(sep), predictions.join(sep))
}

fn score(matches: &ArgMatches) -> Result<()> {
    let model = read_model(matches)?;
    let lines = read_lines(matches)?;
    let scorer = MarkovScorer::new(&model);
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    for (idx, lk) in scorer.log_likelihood_batch(&lines).into_iter().enumerate() {
        match lk {
            Ok(lk) => writeln!(wtr, "{}\t{:.4}", idx, lk)?,
            Err(why) => warn!("{}\t{}", idx, why),
        }
    }
    Ok(())
}

fn simulate(matches: &ArgMatches) -> Result<()> {
    let model = read_model(matches)?;
    let engine = HmmEngine::new(&model)?;
    let length = value_t!(matches, "length", usize).unwrap_or_else(|e| e.exit());
    let seed = value_t!(matches, "seed", u64).unwrap_or_else(|e| e.exit());
    let mut rng: Xoshiro256StarStar = SeedableRng::seed_from_u64(seed);
    let trajectory = engine.simulate(length, &mut rng);
    let (hidden, observed) = engine.trajectory_labels(&trajectory);
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    writeln!(wtr, "observations: {}", render(&observed))?;
    if matches.is_present("decode") && !trajectory.is_empty() {
        let predicted = engine.viterbi(&trajectory.observed)?;
        let predicted_labels = model.states().decode(&predicted.path);
        let (states, bar, predictions) = align_decoded(&hidden, &predicted_labels);
        writeln!(wtr, "states:       {}", states)?;
        writeln!(wtr, "              {}", bar)?;
        writeln!(wtr, "predictions:  {}", predictions)?;
        let accuracy = trajectory
            .hidden
            .iter()
            .zip(predicted.path.iter())
            .filter(|(x, y)| x == y)
            .count();
        info!("ACCURACY\t{}\t{}", accuracy, trajectory.len());
    } else {
        writeln!(wtr, "states:       {}", render(&hidden))?;
    }
    Ok(())
}

fn viterbi(matches: &ArgMatches) -> Result<()> {
    let model = read_model(matches)?;
    let engine = HmmEngine::new(&model)?;
    let lines = read_lines(matches)?;
    let results: Vec<_> = lines
        .par_iter()
        .map(|line| {
            engine
                .encode_observations_str(line)
                .and_then(|obs| engine.viterbi(&obs))
        })
        .collect();
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    for (idx, result) in results.into_iter().enumerate() {
        match result {
            Ok(result) => {
                let path = render(&model.states().decode(&result.path));
                writeln!(wtr, "{}\t{:.4}\t{}", idx, result.log_probability(), path)?;
            }
            Err(why) => warn!("{}\t{}", idx, why),
        }
    }
    Ok(())
}

fn posterior(matches: &ArgMatches) -> Result<()> {
    let model = read_model(matches)?;
    let engine = HmmEngine::new(&model)?;
    let lines = read_lines(matches)?;
    let results: Vec<_> = lines
        .par_iter()
        .map(|line| {
            engine
                .encode_observations_str(line)
                .and_then(|obs| engine.forward_backward(&obs).map(|fb| (obs, fb)))
        })
        .collect();
    let stdout = std::io::stdout();
    let mut wtr = BufWriter::new(stdout.lock());
    let header = model.states().labels().join("\t");
    for (idx, result) in results.into_iter().enumerate() {
        let (obs, fb) = match result {
            Ok(res) => res,
            Err(why) => {
                warn!("{}\t{}", idx, why);
                continue;
            }
        };
        writeln!(wtr, ">{}\t{:.4}", idx, fb.log_likelihood)?;
        writeln!(wtr, "pos\tobs\t{}", header)?;
        let symbols = engine.symbols().decode(&obs);
        for (t, (column, symbol)) in fb.posterior.columns().zip(symbols).enumerate() {
            let probs: Vec<_> = column.iter().map(|x| format!("{:.4}", x)).collect();
            writeln!(wtr, "{}\t{}\t{}", t, symbol, probs.join("\t"))?;
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let matches = App::new("hmmcore")
        .version("0.1")
        .author("Bansho Masutani")
        .about("Score, decode, and simulate sequences with discrete hidden Markov models.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .subcommand(subcommand_score())
        .subcommand(subcommand_simulate())
        .subcommand(subcommand_viterbi())
        .subcommand(subcommand_posterior())
        .get_matches();
    if let Some(sub_m) = matches.subcommand().1 {
        let level = match sub_m.occurrences_of("verbose") {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
        let threads = value_t!(sub_m, "threads", usize).unwrap_or_else(|e| e.exit());
        if let Err(why) = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
        {
            debug!("{:?}", why);
        }
    }
    debug!("Start");
    match matches.subcommand() {
        ("score", Some(sub_m)) => score(sub_m),
        ("simulate", Some(sub_m)) => simulate(sub_m),
        ("viterbi", Some(sub_m)) => viterbi(sub_m),
        ("posterior", Some(sub_m)) => posterior(sub_m),
        _ => unreachable!(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    #[test]
    fn decoded_columns_line_up() {
        let truth = ["Gene", "Intergenic", "Gene"];
        let predicted = ["Gene", "Gene", "Intergenic"];
        let (states, bar, predictions) = align_decoded(&truth, &predicted);
        assert_eq!(states, "Gene Intergenic Gene      ");
        assert_eq!(bar, "||||                      ");
        assert_eq!(predictions, "Gene Gene       Intergenic");
        assert_eq!(states.len(), bar.len());
        assert_eq!(states.len(), predictions.len());
        let (states, bar, predictions) = align_decoded(&["G", "I", "G"], &["G", "G", "G"]);
        assert_eq!(states, "GIG");
        assert_eq!(bar, "| |");
        assert_eq!(predictions, "GGG");
    }
}
