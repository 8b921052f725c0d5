use atty::Stream;
use crossterm::{
    event::{self, Event, KeyCode},
    terminal::{disable_raw_mode, enable_raw_mode},
};

use flashlearn::app::App;

fn require_tty() {
    if !atty::is(Stream::Stdin) || !atty::is(Stream::Stdout) {
        eprintln!("TTY required");
        std::process::exit(2);
    }
}

fn read_key() -> anyhow::Result<KeyCode> {
    enable_raw_mode()?;
    let code = loop {
        if let Event::Key(key_event) = event::read()? {
            break key_event.code;
        }
    };
    disable_raw_mode()?;
    Ok(code)
}

/// Flip-card viewer: question up front, flip and navigate on keys.
pub async fn study(app: &App, set_id: &str) -> anyhow::Result<()> {
    require_tty();

    let controller = app.set_controller();
    controller.force_refresh(set_id).await;
    let state = controller.snapshot();
    if let Some(err) = state.error {
        anyhow::bail!(err);
    }
    let set = state
        .current_set
        .ok_or_else(|| anyhow::anyhow!("set not found: {set_id}"))?;

    controller.shuffle_flashcards();
    let cards = controller.snapshot().flashcards;
    if cards.is_empty() {
        println!("'{}' has no cards yet", set.title);
        return Ok(());
    }

    let mut index = 0;
    let mut flipped = false;
    loop {
        print!("\x1b[2J\x1b[H");
        let card = &cards[index];
        println!("\x1b[1m{}\x1b[0m  ({}/{})\n", set.title, index + 1, cards.len());
        if flipped {
            println!("A: \x1b[1;32m{}\x1b[0m\n", card.answer);
        } else {
            println!("Q: \x1b[1m{}\x1b[0m\n", card.question);
        }
        println!("space: flip   n: next   p: previous   q: quit");

        match read_key()? {
            KeyCode::Char(' ') | KeyCode::Enter => flipped = !flipped,
            KeyCode::Char('n') | KeyCode::Right => {
                index = (index + 1) % cards.len();
                flipped = false;
            }
            KeyCode::Char('p') | KeyCode::Left => {
                index = (index + cards.len() - 1) % cards.len();
                flipped = false;
            }
            KeyCode::Char('q') | KeyCode::Esc => break,
            _ => {}
        }
    }
    Ok(())
}

/// Multiple-choice quiz: one question per screen, digits pick an option.
pub async fn quiz(app: &App, set_id: &str) -> anyhow::Result<()> {
    require_tty();

    let controller = app.quiz_controller();
    controller.load_set(set_id).await;
    controller.generate_quiz(set_id).await;
    let state = controller.snapshot();
    if let Some(err) = state.error {
        anyhow::bail!(err);
    }
    if state.questions.is_empty() {
        println!("no cards to quiz on");
        return Ok(());
    }

    for (number, question) in state.questions.iter().enumerate() {
        print!("\x1b[2J\x1b[H");
        println!("Question {}/{}\n", number + 1, state.questions.len());
        println!("\x1b[1m{}\x1b[0m\n", question.question);
        for (i, option) in question.options.iter().enumerate() {
            println!("  {}) {}", i + 1, option);
        }
        println!();

        let selected = loop {
            if let KeyCode::Char(c) = read_key()? {
                if let Some(digit) = c.to_digit(10) {
                    let digit = digit as usize;
                    if (1..=question.options.len()).contains(&digit) {
                        break question.options[digit - 1].clone();
                    }
                }
            }
        };

        if controller.record_answer(question.clone(), &selected) {
            println!("\x1b[1;32mCorrect!\x1b[0m");
        } else {
            println!(
                "\x1b[1;31mWrong.\x1b[0m The answer was: {}",
                question.correct_answer
            );
        }
        read_key()?;
    }

    let (correct, total) = controller.score();
    print!("\x1b[2J\x1b[H");
    println!("Score: {correct}/{total}");
    Ok(())
}
