mod args;
mod proc;

use anyhow::Result;
use log::info;
use pyrometry::{cli::init_logging, GraduationStore};

use crate::{
    args::{Args, Command},
    proc::{run_apply, run_grad},
};

fn main() -> Result<()> {
    let args = Args::from_cmd_line()?;
    init_logging(args.debug);

    let Args {
        grad_name,
        grad_dir,
        command,
        ..
    } = args;

    let store = GraduationStore::new(grad_dir);
    info!("using graduation {}", grad_name);

    match command {
        Command::Grad(grad_args) => run_grad(&store, &grad_name, &grad_args),
        Command::Apply(apply_args) => run_apply(&store, &grad_name, &apply_args),
    }
}
