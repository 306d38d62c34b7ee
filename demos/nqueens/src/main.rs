//! N-queens with incremental scoring.
//!
//! Places `n` queens on random rows, then repeatedly moves one queen to the
//! row with the best incremental score until no conflicts remain.
//!
//! ```text
//! cargo run -p nqueens -- [n] [seed]
//! RUST_LOG=nqueens=debug cargo run -p nqueens -- 16
//! ```
//!
//! An `engine.toml` in the working directory, if present, selects the
//! environment mode and constraint weights.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tupleflow::prelude::*;

const MAX_STEPS: usize = 10_000;

#[derive(Clone, Debug)]
struct Queen {
    column: i64,
    row: i64,
}

impl Queen {
    fn ascending_diagonal(&self) -> i64 {
        self.row + self.column
    }

    fn descending_diagonal(&self) -> i64 {
        self.row - self.column
    }
}

fn define_constraints(factory: &ConstraintFactory<Queen, SimpleScore>) {
    factory
        .for_all()
        .join_unique(joiner::equal(|q: &Queen| q.row))
        .penalize(SimpleScore::ONE)
        .as_constraint("Row conflict");
    factory
        .for_all()
        .join_unique(joiner::equal(Queen::ascending_diagonal))
        .penalize(SimpleScore::ONE)
        .as_constraint("Ascending diagonal conflict");
    factory
        .for_all()
        .join_unique(joiner::equal(Queen::descending_diagonal))
        .penalize(SimpleScore::ONE)
        .as_constraint("Descending diagonal conflict");
}

fn parse_arg<T: std::str::FromStr>(args: &[String], index: usize, default: T) -> T {
    args.get(index)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(default)
}

// Moves `handle` to the row with the best score, breaking ties at random.
fn best_move(
    session: &mut Session<Queen, SimpleScore>,
    handle: FactHandle,
    n: i64,
    rng: &mut ChaCha8Rng,
) -> Result<SimpleScore, TupleFlowError> {
    let mut best_rows = Vec::new();
    let mut best_score = None;
    for row in 0..n {
        session.update_fact(handle, |q| q.row = row)?;
        let score = session.calculate_score()?;
        match best_score {
            Some(best) if score < best => {}
            Some(best) if score == best => best_rows.push(row),
            _ => {
                best_score = Some(score);
                best_rows.clear();
                best_rows.push(row);
            }
        }
    }
    let row = best_rows[rng.random_range(0..best_rows.len())];
    session.update_fact(handle, |q| q.row = row)?;
    session.calculate_score()
}

fn main() -> Result<(), TupleFlowError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let n: i64 = parse_arg(&args, 1, 8).max(1);
    let seed: u64 = parse_arg(&args, 2, 42);

    let config = match EngineConfig::load("engine.toml") {
        Ok(config) => config,
        Err(err) => {
            debug!(event = "config_defaulted", reason = %err);
            EngineConfig::default()
        }
    };

    let factory = ConstraintFactory::new();
    define_constraints(&factory);
    let mut session = factory.build_from_config(&config)?;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut handles = Vec::new();
    for column in 0..n {
        let row = rng.random_range(0..n);
        handles.push(session.insert_fact(Queen { column, row })?);
    }
    let mut score = session.calculate_score()?;
    info!(
        event = "board_placed",
        n,
        seed,
        mode = ?config.environment_mode,
        score = %score,
    );

    let mut steps = 0;
    while score < SimpleScore::ZERO && steps < MAX_STEPS {
        let handle = handles[rng.random_range(0..handles.len())];
        score = best_move(&mut session, handle, n, &mut rng)?;
        steps += 1;
        debug!(event = "step", step = steps, score = %score);
    }

    for total in session.constraint_totals() {
        info!(
            event = "constraint_total",
            constraint = %total.constraint_ref.full_name(),
            matches = total.match_count,
            score = %total.score,
        );
    }
    if score == SimpleScore::ZERO {
        info!(event = "solved", steps, tuples = session.tuple_count());
    } else {
        warn!(event = "gave_up", steps, score = %score);
    }

    let mut board: Vec<&Queen> = session.facts().map(|(_, q)| q).collect();
    board.sort_by_key(|q| q.column);
    for row in 0..n {
        let line: String = board
            .iter()
            .map(|q| if q.row == row { " Q" } else { " ." })
            .collect();
        println!("{line}");
    }
    Ok(())
}
