//! Collect, validate and mail a registration through the facade

use formpost::prelude::*;
use rstest::rstest;
use std::sync::Arc;

fn registration() -> FormDocument {
	FormDocument::new()
		.with(FormElement::text("person-first-name").with_value("Ada").required())
		.with(FormElement::email("person-email").with_value("ada@example.com").required())
		.with(FormElement::textarea("comments"))
		.with(FormElement::checkbox("workshops", "Parsing").checked())
		.with(FormElement::checkbox("workshops", "Codecs").checked())
}

#[rstest]
#[tokio::test]
async fn test_collected_form_is_mailed() {
	// Arrange
	let form = registration();
	let collected = collect(&form);
	Validator::new().validate(&collected).unwrap();
	let backend = MemoryBackend::new();
	let composer = MailComposer::new(Arc::new(backend.clone()), Address::new("noreply@example.com"));
	let job = MailJob::new(vec![Address::new("office@example.com")])
		.subject("Registration: %person-first-name%")
		.template("<p>%person-first-name%</p><p>%workshops%</p><p>%comments%</p><p>%phone%</p>")
		.reply_to("ada@example.com")
		.data(collected.snapshot);

	// Act
	let outcome = composer.compose(&job).await.unwrap();

	// Assert
	assert!(outcome.success);
	assert_eq!(outcome.message, "Email sent successfully | No autoresponder configured");
	let sent = backend.sent_messages();
	assert_eq!(sent.len(), 1);
	assert_eq!(sent[0].subject(), "Registration: Ada");
	assert_eq!(
		sent[0].html_body(),
		"<p>Ada</p><p>Parsing, Codecs</p><p></p><p>[Not Provided]</p>"
	);
	assert_eq!(sent[0].reply_to()[0].email(), "ada@example.com");
}

#[rstest]
fn test_required_field_blocks_submission() {
	// Arrange
	let mut form = registration();
	form.change("person-first-name", "  ");

	// Act
	let result = Validator::new().validate(&collect(&form));

	// Assert
	let err = result.unwrap_err();
	assert_eq!(err.field, "person-first-name");
	assert_eq!(Error::from(err).user_message(), "Person First Name is required!");
}
