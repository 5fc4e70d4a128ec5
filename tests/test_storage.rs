//! Integration tests for template persistence.

use serde_json::json;
use template_oxide::storage::{FileTemplateStore, InMemoryTemplateStore, TemplateStore};
use template_oxide::template::{Template, TemplateAssembler};

fn generated(title: &str, subject: &str) -> Template {
    let analysis = json!({
        "documentStructure": {
            "type": "exam",
            "subject": subject,
            "sections": [{"role": "header", "content": title}, {"role": "content", "content": "Good luck"}]
        },
        "extractedQuestions": [],
        "extractedContent": {"title": title}
    });
    TemplateAssembler::default()
        .create_from_value(&analysis)
        .unwrap()
        .template
        .unwrap()
}

/// Runs the collaborator contract against any store.
fn exercise_contract(store: &dyn TemplateStore) {
    let algebra = generated("Algebra Midterm", "Math");
    let poetry = generated("Thơ lục bát", "Văn học");

    store.save(&algebra).unwrap();
    store.save(&poetry).unwrap();

    assert_eq!(store.load(&algebra.id).unwrap(), Some(algebra.clone()));
    assert!(store.load("missing").unwrap().is_none());

    let listed: Vec<_> = store.list().unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(listed, vec![algebra.id.clone(), poetry.id.clone()]);

    let hits = store.search("midterm").unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Algebra Midterm");
    assert_eq!(hits[0].pages, 1);
    assert_eq!(store.search("VĂN").unwrap().len(), 1);
    assert_eq!(store.search("exam").unwrap().len(), 2);

    assert!(store.delete(&algebra.id).unwrap());
    assert!(!store.delete(&algebra.id).unwrap());
    assert_eq!(store.list().unwrap().len(), 1);
}

#[test]
fn test_in_memory_store_contract() {
    exercise_contract(&InMemoryTemplateStore::new());
}

#[test]
fn test_file_store_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTemplateStore::open(dir.path()).unwrap();
    exercise_contract(&store);
}

#[test]
fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let template = generated("Geometry Quiz", "Math");
    {
        let store = FileTemplateStore::open(dir.path()).unwrap();
        store.save(&template).unwrap();
    }

    let reopened = FileTemplateStore::open(dir.path()).unwrap();
    assert_eq!(reopened.load(&template.id).unwrap(), Some(template.clone()));
    assert!(dir.path().join(format!("{}.json", template.id)).exists());

    assert!(reopened.delete(&template.id).unwrap());
    assert!(!dir.path().join(format!("{}.json", template.id)).exists());
    assert!(FileTemplateStore::open(dir.path()).unwrap().list().unwrap().is_empty());
}

#[test]
fn test_file_store_rejects_unsafe_ids() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileTemplateStore::open(dir.path()).unwrap();
    let mut template = generated("Quiz", "Math");
    template.id = "../outside".to_string();
    assert!(store.save(&template).is_err());
    assert!(store.list().unwrap().is_empty());
}
