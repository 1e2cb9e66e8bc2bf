//! Runs the PAM account phase for one user and service and exits with the
//! PAM result code, so a parent process can read the decision off the exit
//! status.
use std::env;
use std::process::exit;

use pam_hbac_harness::pam::sys::PAM_SYSTEM_ERR;
use pam_hbac_harness::pam::{AccountCheck, LibPam, PamError, PamErrorType};

const DEFAULT_SERVICE: &str = "pam_hbac_test";
const DEFAULT_USER: &str = "dummy";

fn main() {
    pam_hbac_harness::log::init();

    let mut args = env::args().skip(1);
    let user = args.next();
    let service = args.next();
    if user.is_none() {
        eprintln!("missing user and service name, using default");
    } else if service.is_none() {
        println!("using first argument as user and default service name");
    }
    let user = user.unwrap_or_else(|| DEFAULT_USER.to_string());
    let service = service.unwrap_or_else(|| DEFAULT_SERVICE.to_string());

    println!("service: {service}\nuser: {user}");

    match LibPam.acct_mgmt(&user, &service) {
        Ok(code) => {
            println!("pam_acct_mgmt: {}", PamErrorType::from_int(code));
            exit(code)
        }
        Err(PamError::Pam(tp)) => {
            eprintln!("pam_start failed: {tp}");
            exit(tp.as_int())
        }
        Err(err) => {
            eprintln!("{err}");
            exit(PAM_SYSTEM_ERR)
        }
    }
}
