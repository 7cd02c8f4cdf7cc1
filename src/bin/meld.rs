use std::{ffi::CString, sync::Arc};

use kfd::{
    kernel::{Fd, Limits, Process, UserPtr, syscall::sys_meld},
    vfs::host::HostVfs,
};

fn usage() -> ! {
    eprintln!("meld [-n open_max] root source1 source2 destination");
    std::process::exit(1);
}

fn main() {
    env_logger::init();

    let mut limits = Limits::default();
    let mut positional = Vec::new();
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "-n" {
            limits.open_max = match args.next().map(|n| n.parse::<usize>()) {
                Some(Ok(n)) if Fd::try_from(n).is_ok() => n,
                Some(Ok(n)) => {
                    eprintln!("meld: -n {n} exceeds the largest descriptor");
                    usage();
                }
                _ => {
                    eprintln!("meld: -n expects a number");
                    usage();
                }
            };
        } else if positional.len() < 4 {
            positional.push(arg);
        } else {
            eprintln!("meld: too many arguments");
            usage();
        }
    }

    let [root, paths @ ..] = positional.as_slice() else {
        eprintln!("meld: no root specified");
        usage();
    };
    let [source1, source2, destination] = paths else {
        eprintln!("meld: expected two sources and a destination");
        usage();
    };

    let cpaths = match [source1, source2, destination].map(|p| CString::new(p.as_str())) {
        [Ok(p1), Ok(p2), Ok(p3)] => [p1, p2, p3],
        _ => {
            eprintln!("meld: paths must not contain NUL bytes");
            std::process::exit(1);
        }
    };

    let vfs = Arc::new(HostVfs::new(root));
    let process = Process::new(vfs, limits);

    match sys_meld(
        &process,
        UserPtr::from(cpaths[0].as_c_str()),
        UserPtr::from(cpaths[1].as_c_str()),
        UserPtr::from(cpaths[2].as_c_str()),
    ) {
        Ok(size) => println!("{size}"),
        Err(e) => {
            eprintln!(
                "meld: failed to meld {} and {} into {}: {}",
                source1, source2, destination, e
            );
            std::process::exit(1);
        }
    }
}
