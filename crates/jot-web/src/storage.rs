use anyhow::anyhow;
use jot_core::{
  EditRequest,
  EditResponse,
  KeyValueStore
};

/// `window.localStorage` behind the
/// core storage seam.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

fn local_storage()
-> anyhow::Result<web_sys::Storage> {
  web_sys::window()
    .ok_or_else(|| {
      anyhow!("no browser window")
    })?
    .local_storage()
    .map_err(|err| {
      anyhow!(
        "localStorage unavailable: \
         {err:?}"
      )
    })?
    .ok_or_else(|| {
      anyhow!(
        "localStorage is disabled"
      )
    })
}

impl KeyValueStore for LocalStorageStore {
  fn get_item(
    &self,
    key: &str
  ) -> anyhow::Result<Option<String>> {
    local_storage()?.get_item(key).map_err(
      |err| {
        anyhow!(
          "failed reading {key}: \
           {err:?}"
        )
      }
    )
  }

  fn set_item(
    &mut self,
    key: &str,
    value: &str
  ) -> anyhow::Result<()> {
    local_storage()?
      .set_item(key, value)
      .map_err(|err| {
        anyhow!(
          "failed writing {key}: \
           {err:?}"
        )
      })
  }
}

/// Answers an edit request with the
/// browser's modal prompt. Dismissing
/// it cancels.
pub fn prompt_for_edit(
  request: &EditRequest
) -> EditResponse {
  let answer = web_sys::window()
    .and_then(|window| {
      window
        .prompt_with_message_and_default(
          "Edit item:",
          &request.current_text
        )
        .ok()
        .flatten()
    });

  match answer {
    | Some(text) => {
      EditResponse::Replace(text)
    }
    | None => EditResponse::Cancel
  }
}
