use scraper::{ElementRef, Html, Selector};

#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&Selector::parse("form").unwrap())
        .next()
        .expect("No form found")
}

#[track_caller]
pub(crate) fn assert_selected_option(form: &ElementRef<'_>, name: &str, value: &str) {
    let selector = Selector::parse(&format!("select[name={name}] option[selected]")).unwrap();
    let selected: Vec<_> = form
        .select(&selector)
        .filter_map(|option| option.value().attr("value"))
        .collect();

    assert_eq!(
        selected,
        vec![value],
        "want select {name} to have option {value:?} selected, got {selected:?}"
    );
}

#[track_caller]
pub(crate) fn assert_text_input_with_value(form: &ElementRef<'_>, name: &str, value: &str) {
    for input in form.select(&Selector::parse("input").unwrap()) {
        if input.value().attr("name") == Some(name) {
            let input_type = input.value().attr("type").unwrap_or_default();
            let input_value = input.value().attr("value").unwrap_or_default();

            assert_eq!(
                input_type, "text",
                "want input with type \"text\", got {input_type:?}"
            );
            assert_eq!(
                input_value, value,
                "want input with value \"{value}\", got {input_value:?}"
            );

            return;
        }
    }

    panic!("No input found with name \"{name}\"");
}
