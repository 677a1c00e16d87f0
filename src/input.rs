use std::io::{self, BufRead};
use std::thread;

use crossbeam::channel::Sender;

use crate::{AppOp, Scalar};

/// Read keys from stdin on a detached thread. The terminal stays in line
/// mode, so keys arrive once Enter is pressed.
pub fn spawn(main_conn: Sender<Scalar>) {
    let spawned = thread::Builder::new()
        .name("input".into())
        .spawn(move || {
            let stdin = io::stdin();
            forward_keys(stdin.lock(), &main_conn);
        });
    if let Err(e) = spawned {
        log::error!("can't spawn input thread: {}", e);
    }
}

/// Post one `Rawkeys` message per character until EOF, then `Quit`.
pub fn forward_keys(reader: impl BufRead, main_conn: &Sender<Scalar>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                log::error!("can't read keyboard input: {}", e);
                break;
            }
        };
        for key in line.chars() {
            if main_conn.send(Scalar::new(AppOp::Rawkeys, key as usize)).is_err() {
                return;
            }
        }
    }
    main_conn.send(Scalar::new(AppOp::Quit, 0)).ok();
}
