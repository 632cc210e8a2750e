//! What-if exploration of a tiny duel.
//!
//! Demonstrates: static config → scratch state → nested `branch` /
//! `next_branch` loops → best line found by exhaustive search.
//!
//! Run with `RUST_LOG=sprig_frame=debug` to see every frame enter/exit.

use sprig::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Hit points of both duelists, kept in the value stack.
#[derive(Clone, Copy)]
struct Duel {
    hp: ValueSpan,
}

const STRIKE: BranchId = BranchId(1);
const HEAVY: BranchId = BranchId(2);
const HEAL: BranchId = BranchId(3);
const TURNS: usize = 4;

/// Apply one of our moves, followed by the opponent's fixed reply.
fn play(stack: &mut FrameStack, duel: Duel, action: BranchId) -> Result<(), StackError> {
    let hp = stack.scratch_as_mut::<i32>(&duel.hp)?;
    match action {
        STRIKE => hp[1] -= 3,
        HEAVY => {
            hp[1] -= 6;
            hp[0] -= 2;
        }
        HEAL => hp[0] += 4,
        _ => {}
    }
    if hp[1] > 0 {
        hp[0] -= 4;
    }
    Ok(())
}

/// Score the current state: opponent down is best, then our margin.
fn score(stack: &FrameStack, duel: Duel) -> Result<i32, StackError> {
    let hp = stack.scratch_as::<i32>(&duel.hp)?;
    Ok(match (hp[0] > 0, hp[1] > 0) {
        (true, false) => 1000 + hp[0],
        (false, _) => -1000,
        _ => hp[0] - hp[1],
    })
}

/// Depth-first search over our moves; returns the best score and line.
fn search(
    stack: &mut FrameStack,
    duel: Duel,
    turn: usize,
) -> Result<(i32, Vec<BranchId>), StackError> {
    let now = score(stack, duel)?;
    if turn == TURNS || now.abs() >= 1000 {
        return Ok((now, Vec::new()));
    }

    let mut best = (i32::MIN, Vec::new());
    let mut next = stack.branch(&[STRIKE, HEAVY, HEAL])?;
    while let Some(action) = next {
        play(stack, duel, action)?;
        let (value, mut line) = search(stack, duel, turn + 1)?;
        if value > best.0 {
            line.insert(0, action);
            best = (value, line);
        }
        next = stack.next_branch()?;
    }
    stack.exit()?;
    Ok(best)
}

fn main() -> Result<(), StackError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let mut stack = FrameStack::new(StackConfig {
        max_depth: TURNS + 1,
        ..StackConfig::default()
    })?;

    let hp = stack.alloc_scratch_slice::<i32>(2)?;
    stack.scratch_as_mut::<i32>(&hp)?.copy_from_slice(&[12, 14]);
    let duel = Duel { hp };

    let (value, line) = search(&mut stack, duel, 0)?;
    let names: Vec<&str> = line
        .iter()
        .map(|id| match *id {
            STRIKE => "strike",
            HEAVY => "heavy",
            HEAL => "heal",
            _ => "?",
        })
        .collect();

    info!(score = value, line = ?names, "best line");
    let m = stack.metrics();
    info!(
        frames = m.frames_entered,
        restores = m.restores,
        bytes_restored = m.bytes_restored,
        memory = stack.memory_bytes(),
        "search done"
    );
    println!("best line {names:?} scores {value}");

    stack.destroy();
    Ok(())
}
