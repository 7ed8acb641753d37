use chrono::Utc;
use gloo::timers::callback::Timeout;
use jot_core::{
  DEFAULT_STORAGE_KEY,
  FilterMode,
  ListController,
  SortMode
};
use web_sys::{
  HtmlInputElement,
  HtmlSelectElement
};
use yew::{
  Callback,
  Event,
  Html,
  SubmitEvent,
  TargetCast,
  function_component,
  html,
  use_force_update,
  use_mut_ref,
  use_node_ref
};

use crate::components::TodoRow;
use crate::storage::{
  LocalStorageStore,
  prompt_for_edit
};

#[function_component(App)]
pub fn app() -> Html {
  let list = use_mut_ref(|| {
    ListController::initialize(
      LocalStorageStore,
      DEFAULT_STORAGE_KEY
    )
  });
  let refresh = use_force_update();
  let input_ref = use_node_ref();

  let on_submit = {
    let list = list.clone();
    let refresh = refresh.clone();
    let input_ref = input_ref.clone();
    Callback::from(
      move |event: SubmitEvent| {
        event.prevent_default();
        let Some(input) = input_ref
          .cast::<HtmlInputElement>()
        else {
          return;
        };

        let added = list
          .borrow_mut()
          .add_item(
            &input.value(),
            Utc::now()
          );
        match added {
          | Ok(Some(_)) => {
            input.set_value("");
            refresh.force_update();
          }
          | Ok(None) => {}
          | Err(err) => {
            tracing::error!(
              error = %format!("{err:#}"),
              "failed adding item"
            );
          }
        }
      }
    )
  };

  let on_filter = {
    let list = list.clone();
    let refresh = refresh.clone();
    Callback::from(move |event: Event| {
      let select: HtmlSelectElement =
        event.target_unchecked_into();
      list.borrow_mut().set_filter(
        FilterMode::from_value(
          &select.value()
        )
      );
      refresh.force_update();
    })
  };

  let on_sort = {
    let list = list.clone();
    let refresh = refresh.clone();
    Callback::from(move |event: Event| {
      let select: HtmlSelectElement =
        event.target_unchecked_into();
      list.borrow_mut().set_sort(
        SortMode::from_value(
          &select.value()
        )
      );
      refresh.force_update();
    })
  };

  let on_toggle = {
    let list = list.clone();
    let refresh = refresh.clone();
    Callback::from(move |id: u64| {
      if let Err(err) = list
        .borrow_mut()
        .toggle_complete(id)
      {
        tracing::error!(
          id,
          error = %format!("{err:#}"),
          "failed toggling item"
        );
      }
      refresh.force_update();
    })
  };

  let on_edit = {
    let list = list.clone();
    let refresh = refresh.clone();
    Callback::from(move |id: u64| {
      let Some(request) =
        list.borrow().request_edit(id)
      else {
        return;
      };
      let response =
        prompt_for_edit(&request);
      if let Err(err) = list
        .borrow_mut()
        .resolve_edit(&request, response)
      {
        tracing::error!(
          id,
          error = %format!("{err:#}"),
          "failed editing item"
        );
      }
      refresh.force_update();
    })
  };

  let on_delete = {
    let list = list.clone();
    let refresh = refresh.clone();
    Callback::from(move |id: u64| {
      let due = list
        .borrow_mut()
        .schedule_remove(id, Utc::now());
      refresh.force_update();

      let wait = (due - Utc::now())
        .num_milliseconds()
        .max(0);
      let list = list.clone();
      let refresh = refresh.clone();
      Timeout::new(
        u32::try_from(wait).unwrap_or(0),
        move || {
          if let Err(err) = list
            .borrow_mut()
            .flush_removals(due)
          {
            tracing::error!(
              id,
              error = %format!("{err:#}"),
              "failed removing item"
            );
          }
          refresh.force_update();
        }
      )
      .forget();
    })
  };

  let (rows, view, stats) = {
    let list = list.borrow();
    (list.render(), list.view(), list.stats())
  };

  html! {
      <main class="jot">
          <h1>{ "jot" }</h1>
          <form class="todo-form" onsubmit={on_submit}>
              <input
                  ref={input_ref}
                  type="text"
                  placeholder="What needs doing?"
              />
              <button type="submit">{ "Add" }</button>
          </form>
          <div class="controls">
              <select class="filter" onchange={on_filter}>
                  {
                      for FilterMode::ALL.iter().map(|mode| html! {
                          <option value={mode.as_str()} selected={*mode == view.filter}>
                              { mode.label() }
                          </option>
                      })
                  }
              </select>
              <select class="sort" onchange={on_sort}>
                  {
                      for SortMode::ALL.iter().map(|mode| html! {
                          <option value={mode.as_str()} selected={*mode == view.sort}>
                              { mode.label() }
                          </option>
                      })
                  }
              </select>
          </div>
          <ul class="todo-list">
              {
                  for rows.into_iter().map(|row| {
                      let key = row.id;
                      html! {
                          <TodoRow
                              key={key}
                              row={row}
                              on_toggle={on_toggle.clone()}
                              on_edit={on_edit.clone()}
                              on_delete={on_delete.clone()}
                          />
                      }
                  })
              }
          </ul>
          <div class="stats">
              {
                  format!(
                      "{} item(s), {} completed, {} remaining",
                      stats.total,
                      stats.completed,
                      stats.remaining
                  )
              }
          </div>
      </main>
  }
}
