use jot_core::{
  RowAction,
  RowDescriptor
};
use yew::{
  Callback,
  Html,
  Properties,
  classes,
  function_component,
  html
};

#[derive(Properties, PartialEq)]
pub struct TodoRowProps {
  pub row:       RowDescriptor,
  pub on_toggle: Callback<u64>,
  pub on_edit:   Callback<u64>,
  pub on_delete: Callback<u64>
}

#[function_component(TodoRow)]
pub fn todo_row(
  props: &TodoRowProps
) -> Html {
  let id = props.row.id;
  let on_toggle =
    props.on_toggle.clone();
  let on_edit = props.on_edit.clone();
  let on_delete =
    props.on_delete.clone();

  let item_class = classes!(
    "todo-item",
    props
      .row
      .removing
      .then_some("removing")
  );
  let text_class = classes!(
    "todo-text",
    props
      .row
      .completed
      .then_some("completed")
  );

  let can_toggle = props
    .row
    .allows(RowAction::ToggleComplete);
  let edit_button =
    if props.row.allows(RowAction::Edit) {
      html! {
          <button class="edit-btn" title="Edit" onclick={move |_| on_edit.emit(id)}>
              { "Edit" }
          </button>
      }
    } else {
      Html::default()
    };
  let delete_button = if props
    .row
    .allows(RowAction::Delete)
  {
    html! {
        <button class="delete-btn" title="Delete" onclick={move |_| on_delete.emit(id)}>
            { "Delete" }
        </button>
    }
  } else {
    Html::default()
  };

  html! {
      <li class={item_class}>
          <input
              type="checkbox"
              checked={props.row.completed}
              disabled={!can_toggle}
              onchange={move |_| on_toggle.emit(id)}
          />
          <span class={text_class}>{ &props.row.text }</span>
          { edit_button }
          { delete_button }
      </li>
  }
}
