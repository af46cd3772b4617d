use std::path::Path;

use wikiscript_core::harness::TestHarness;

pub fn run(config: Option<&Path>, module: &str) {
    let rc = super::load_config("list", config);

    let mut harness = match TestHarness::builtin(&rc) {
        Ok(h) => h,
        Err(e) => fail(&e.to_string()),
    };

    let provider = match harness.provider(module) {
        Ok(p) => p,
        Err(e) => fail(&e.to_string()),
    };

    let mut count = 0;
    for case in provider.cases() {
        match case {
            Ok(case) => {
                println!("{}\t{}", case.key, case.name);
                count += 1;
            }
            Err(e) => fail(&e.to_string()),
        }
    }
    println!("-- {count} cases --");

    drop(provider);
    if let Err(e) = harness.teardown() {
        fail(&e.to_string());
    }
}

fn fail(message: &str) -> ! {
    println!("FAIL wikiscript list");
    println!("{message}");
    super::exit(1);
}
