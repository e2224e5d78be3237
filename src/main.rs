use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use quiz_client::{
    app_state::AppState,
    config::Config,
    errors::{AppError, AppResult, RecoveryAction},
    models::{
        domain::TimeLimit,
        dto::request::{LoginRequest, QuizListQuery, RegisterRequest},
    },
    services::{AttemptSession, Navigation, SessionPhase, SessionSnapshot},
};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Base URL of the quiz service.
    #[arg(long, env = "QUIZ_API_BASE_URL")]
    api_base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List quizzes in the catalog.
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
    },
    /// Show one quiz.
    Show { quiz_id: i64 },
    /// Take a quiz in the terminal.
    Take {
        quiz_id: i64,
        /// Access key of a private quiz.
        #[arg(short, long)]
        access_key: Option<String>,
    },
    /// Review a finished attempt.
    Result {
        attempt_id: i64,
        #[arg(short, long)]
        access_key: Option<String>,
    },
    /// Show the leaderboard of a quiz.
    Leaderboard { quiz_id: i64 },
    Login {
        username: String,
        #[arg(long, env = "QUIZ_PASSWORD")]
        password: String,
    },
    Register {
        username: String,
        email: String,
        #[arg(long, env = "QUIZ_PASSWORD")]
        password: String,
    },
    Logout,
}

type InputLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::from_env();
    if let Some(url) = args.api_base_url {
        config.api_base_url = url;
    }

    if let Err(err) = run(config, args.command).await {
        log::error!("{}", err);
        match err.recovery() {
            RecoveryAction::Reauthenticate => eprintln!("Log in again with `quiz-client login`."),
            RecoveryAction::ProvideAccessKey => {
                eprintln!("This quiz is private; pass its key with --access-key.")
            }
            RecoveryAction::Retry => eprintln!("The service could not be reached; try again."),
            RecoveryAction::None => {}
        }
        std::process::exit(1);
    }
}

async fn run(config: Config, command: Command) -> AppResult<()> {
    let state = AppState::new(config)?;

    match command {
        Command::List { category, search } => {
            let summaries = state
                .catalog_service
                .list_quizzes(&QuizListQuery { category, search })
                .await?;
            for summary in summaries {
                println!(
                    "#{:<5} {:<40} {:>3} questions  by {}{}",
                    summary.quiz.id,
                    summary.quiz.title,
                    summary
                        .question_count
                        .map_or("?".to_string(), |c| c.to_string()),
                    summary.author_name.as_deref().unwrap_or("unknown"),
                    if summary.quiz.is_public { "" } else { "  [private]" },
                );
            }
        }
        Command::Show { quiz_id } => {
            let summary = state.catalog_service.quiz_detail(quiz_id).await?;
            println!("{}", summary.quiz.title);
            println!("{}", summary.quiz.description);
            if let Some(limit) = summary.quiz.time_limit {
                println!("Time limit: {}", limit);
            }
            if let Some(category) = summary.quiz.category {
                println!("Category: {}", category);
            }
        }
        Command::Take {
            quiz_id,
            access_key,
        } => take_quiz(&state, quiz_id, access_key).await?,
        Command::Result {
            attempt_id,
            access_key,
        } => {
            let review = state.result_service.review(attempt_id, access_key).await?;
            println!(
                "{}: score {}",
                review.quiz.title,
                review
                    .attempt
                    .score
                    .map_or("pending".to_string(), |s| format!("{:.1}", s))
            );
            for (i, item) in review.questions.iter().enumerate() {
                println!("{:>3}. {:?}  {}", i + 1, item.status, item.question.text);
            }
        }
        Command::Leaderboard { quiz_id } => {
            for ranked in state.result_service.leaderboard(quiz_id).await? {
                println!(
                    "{:>3}. {:<20} {:>6.1}  {}",
                    ranked.rank,
                    ranked.entry.username,
                    ranked.entry.score,
                    ranked
                        .entry
                        .time_taken
                        .map_or("-".to_string(), |t| t.to_string())
                );
            }
        }
        Command::Login { username, password } => {
            let claims = state
                .auth_service
                .login(LoginRequest { username, password })
                .await?;
            println!("Logged in as {}", claims.username().unwrap_or("user"));
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            state
                .auth_service
                .register(RegisterRequest {
                    username,
                    email,
                    password,
                })
                .await?;
            println!("Account created");
        }
        Command::Logout => state.auth_service.logout()?,
    }

    Ok(())
}

async fn take_quiz(state: &AppState, quiz_id: i64, access_key: Option<String>) -> AppResult<()> {
    let mut session = state.new_attempt_session();
    session.start(quiz_id, access_key).await?;

    println!("Commands: n(ext) p(rev) g <number> a <option numbers..> f(inish) q(uit)");
    print_question(&session.snapshot()?);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match drive(&session, &mut lines).await? {
            SessionPhase::Completed => break,
            SessionPhase::Failed => {
                let err = session
                    .snapshot()?
                    .last_error
                    .unwrap_or_else(|| AppError::InternalError("submission failed".to_string()));
                println!("Submission failed: {}", err);
                println!("Retry submission? [y/N]");
                match read_line(&mut lines).await? {
                    Some(answer) if answer.trim().eq_ignore_ascii_case("y") => {
                        session = session.retry()?;
                        if let Err(err) = session.finish().await {
                            log::warn!("Retry failed: {}", err);
                        }
                        if session.phase() == SessionPhase::Completed {
                            break;
                        }
                    }
                    _ => return Err(err),
                }
            }
            _ => {
                session.dispose();
                println!("Attempt abandoned");
                return Ok(());
            }
        }
    }

    if let Some(result) = session.snapshot()?.result {
        println!(
            "Finished attempt {}: score {}, time {}",
            result.id,
            result.score.map_or("pending".to_string(), |s| format!("{:.1}", s)),
            result.time_taken.map_or("-".to_string(), |t| t.to_string())
        );
        println!("Review it with `quiz-client result {}`", result.id);
    }
    Ok(())
}

/// Reads commands until the session leaves `InProgress`, racing the countdown.
async fn drive(session: &Arc<AttemptSession>, lines: &mut InputLines) -> AppResult<SessionPhase> {
    let mut phases = session.subscribe();
    if *phases.borrow_and_update() != SessionPhase::InProgress {
        return Ok(session.phase());
    }

    loop {
        let line = tokio::select! {
            changed = phases.changed() => {
                if changed.is_err() {
                    return Ok(session.phase());
                }
                let phase = *phases.borrow_and_update();
                if matches!(phase, SessionPhase::Completed | SessionPhase::Failed) {
                    println!("Time is up.");
                    return Ok(phase);
                }
                continue;
            }
            line = read_line(lines) => line?,
        };

        let Some(line) = line else {
            return Ok(session.phase());
        };

        let mut parts = line.split_whitespace();
        let result = match parts.next() {
            Some("n") => session.navigate(Navigation::Next).map(drop),
            Some("p") => session.navigate(Navigation::Previous).map(drop),
            Some("g") => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
                Some(number) if number > 0 => session.navigate(Navigation::To(number - 1)).map(drop),
                _ => Err(AppError::ValidationError("usage: g <question number>".to_string())),
            },
            Some("a") => answer_current(session, parts.collect()),
            Some("f") => {
                if let Err(err) = session.finish_or_join().await {
                    log::debug!("Finish returned {}", err);
                }
                return Ok(session.phase());
            }
            Some("q") => return Ok(SessionPhase::Idle),
            _ => Err(AppError::ValidationError("unknown command".to_string())),
        };

        if let Err(err) = result {
            println!("{}", err);
        }
        print_question(&session.snapshot()?);
    }
}

// Option numbers are 1-based positions in the current question.
fn answer_current(session: &AttemptSession, numbers: Vec<&str>) -> AppResult<()> {
    let snapshot = session.snapshot()?;
    let question = snapshot
        .current_question
        .ok_or_else(|| AppError::InvalidState("no current question".to_string()))?;

    let option_ids = numbers
        .iter()
        .map(|n| {
            n.parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|i| question.options.get(i))
                .map(|o| o.id)
                .ok_or_else(|| AppError::ValidationError(format!("no option '{}'", n)))
        })
        .collect::<AppResult<Vec<i64>>>()?;

    session.record_answer(question.id, &option_ids)?;
    session.mark_visited(question.id)
}

async fn read_line(lines: &mut InputLines) -> AppResult<Option<String>> {
    lines
        .next_line()
        .await
        .map_err(|e| AppError::InternalError(format!("could not read input: {}", e)))
}

fn print_question(snapshot: &SessionSnapshot) {
    let Some(question) = snapshot.current_question.as_ref() else {
        return;
    };

    let clock = snapshot
        .remaining_secs
        .map(|r| format!("  [{} left]", TimeLimit::from_secs(r)))
        .unwrap_or_default();
    println!(
        "\nQuestion {}/{}{}",
        snapshot.current_index + 1,
        snapshot.question_count,
        clock
    );
    println!("{}", question.text);

    let chosen = snapshot.answers.get(&question.id);
    for (i, option) in question.options.iter().enumerate() {
        let mark = if chosen.is_some_and(|ids| ids.contains(&option.id)) {
            "x"
        } else {
            " "
        };
        println!("  [{}] {}) {}", mark, i + 1, option.text);
    }
}
