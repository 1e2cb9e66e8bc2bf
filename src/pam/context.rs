use std::ffi::{c_int, c_void, CString};
use std::ptr;

use super::sys::*;
use super::{AccountCheck, PamError, PamResult};
use crate::log::pam_debug;

/// Conversation function for a transaction that must never prompt: the
/// account phase of the module under test has nothing to ask.
unsafe extern "C" fn refuse_conversation(
    _num_msg: c_int,
    _msg: *mut *const pam_message,
    resp: *mut *mut pam_response,
    _appdata_ptr: *mut c_void,
) -> c_int {
    if !resp.is_null() {
        // SAFETY: PAM hands us a valid out-pointer for the responses
        unsafe { *resp = ptr::null_mut() };
    }
    PAM_CONV_ERR
}

/// An open libpam transaction for one user and service.
pub struct PamContext {
    pamh: *mut pam_handle_t,
    last_pam_status: Option<c_int>,
}

impl PamContext {
    /// Start a transaction. A failing `pam_start` is an error rather than a
    /// result code, since no module ran.
    pub fn start(service_name: &str, user: &str) -> PamResult<PamContext> {
        let c_service_name = CString::new(service_name)?;
        let c_user = CString::new(user)?;

        let conversation = pam_conv {
            conv: Some(refuse_conversation),
            appdata_ptr: ptr::null_mut(),
        };

        let mut pamh = ptr::null_mut();
        // SAFETY: all pointers are valid for the duration of the call and
        // `pamh` is overwritten by `pam_start`; the conversation struct is
        // copied by libpam.
        let res = unsafe {
            pam_start(
                c_service_name.as_ptr(),
                c_user.as_ptr(),
                &conversation,
                &mut pamh,
            )
        };

        if res != PAM_SUCCESS {
            return Err(PamError::from_pam(res));
        }
        if pamh.is_null() {
            return Err(PamError::from_pam(PAM_SYSTEM_ERR));
        }

        Ok(PamContext {
            pamh,
            last_pam_status: None,
        })
    }

    /// Run the account phase and hand back its raw result code.
    pub fn acct_mgmt(&mut self) -> c_int {
        // SAFETY: `self.pamh` contains a correct handle (obtained from `pam_start`)
        let res = unsafe { pam_acct_mgmt(self.pamh, PAM_SILENT) };
        self.last_pam_status = Some(res);
        res
    }
}

impl Drop for PamContext {
    fn drop(&mut self) {
        // SAFETY: `self.pamh` contains a correct handle (obtained from `pam_start`)
        unsafe {
            pam_end(
                self.pamh,
                self.last_pam_status.unwrap_or(PAM_SUCCESS) | PAM_DATA_SILENT,
            )
        };
    }
}

/// Runs the account check in this process through libpam.
#[derive(Debug, Default, Clone, Copy)]
pub struct LibPam;

impl AccountCheck for LibPam {
    fn acct_mgmt(&self, user: &str, service: &str) -> PamResult<i32> {
        let mut context = PamContext::start(service, user)?;
        let code = context.acct_mgmt();
        pam_debug!("pam_acct_mgmt({service}, {user}) returned {code}");
        Ok(code)
    }
}
