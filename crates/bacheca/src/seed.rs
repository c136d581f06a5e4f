//! Sample records loaded into empty collections.

use chrono::{DateTime, TimeZone, Utc};

use crate::record::{
    Attachment, Document, DocumentType, Entry, Image, Link, NewsItem, Priority, Tags,
};

fn day(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn attachment(id: &str, name: &str, size: &str) -> Attachment {
    Attachment {
        id: id.to_string(),
        name: name.to_string(),
        size_label: size.to_string(),
        locator: "#".to_string(),
    }
}

fn image(id: &str, name: &str, url: &str) -> Image {
    Image {
        id: id.to_string(),
        name: name.to_string(),
        locator: url.to_string(),
    }
}

fn link(id: &str, title: &str, url: &str, description: &str) -> Link {
    Link {
        id: id.to_string(),
        title: title.to_string(),
        url: url.to_string(),
        description: Some(description.to_string()),
    }
}

struct Sample<'a> {
    id: &'a str,
    title: &'a str,
    content: &'a str,
    category: &'a str,
    author: &'a str,
    priority: Priority,
    tags: &'a [&'a str],
    date: DateTime<Utc>,
}

impl Sample<'_> {
    fn into_entry(
        self,
        attachments: Vec<Attachment>,
        images: Vec<Image>,
        links: Vec<Link>,
    ) -> Entry {
        Entry {
            id: self.id.to_string(),
            title: self.title.to_string(),
            content: self.content.to_string(),
            category: self.category.to_string(),
            author: self.author.to_string(),
            priority: self.priority,
            tags: self.tags.iter().copied().collect::<Tags>(),
            attachments,
            images,
            links,
            created_at: self.date,
            updated_at: self.date,
        }
    }
}

/// Sample documents, newest first.
#[must_use]
pub fn documents() -> Vec<Document> {
    vec![
        Document {
            kind: DocumentType::Ordinance,
            entry: Sample {
                id: "1",
                title: "Ordinanza Traffico Centro Storico",
                content: "Ordinanza per la regolamentazione del traffico nel centro storico \
                          durante le festività natalizie.",
                category: "Traffico",
                author: "Comandante Rossi",
                priority: Priority::High,
                tags: &["traffico", "centro storico", "ordinanza"],
                date: day(2024, 1, 15),
            }
            .into_entry(
                vec![attachment("1", "planimetria_centro.pdf", "2.3 MB")],
                vec![image(
                    "1",
                    "mappa_zona.jpg",
                    "https://images.unsplash.com/photo-1524813686514-a57563d77965?w=400",
                )],
                vec![link(
                    "1",
                    "Codice della Strada - Art. 7",
                    "https://www.gazzettaufficiale.it",
                    "Riferimento normativo",
                )],
            ),
        },
        Document {
            kind: DocumentType::Template,
            entry: Sample {
                id: "2",
                title: "Modello Verbale Contravvenzioni",
                content: "Modello standard per la compilazione dei verbali di contravvenzione \
                          al Codice della Strada.",
                category: "Procedure",
                author: "Ufficio Procedure",
                priority: Priority::Medium,
                tags: &["verbale", "contravvenzioni", "modello"],
                date: day(2024, 1, 10),
            }
            .into_entry(
                vec![attachment("2", "modello_verbale.doc", "156 KB")],
                Vec::new(),
                vec![link(
                    "2",
                    "Guida Compilazione Verbali",
                    "https://www.example.com/guida",
                    "Tutorial per la corretta compilazione",
                )],
            ),
        },
    ]
}

/// Sample news items, newest first.
#[must_use]
pub fn news() -> Vec<NewsItem> {
    vec![
        NewsItem {
            entry: Sample {
                id: "1",
                title: "Nuove Disposizioni per il Controllo del Territorio",
                content: "Sono state emanate nuove disposizioni per il controllo del territorio \
                          durante il periodo festivo. Tutti gli agenti sono tenuti a prendere \
                          visione delle nuove procedure.",
                category: "Disposizioni",
                author: "Comando Centrale",
                priority: Priority::High,
                tags: &["controllo territorio", "procedure", "festivo"],
                date: day(2024, 1, 20),
            }
            .into_entry(
                vec![attachment("1", "disposizioni_territorio.pdf", "1.2 MB")],
                vec![image(
                    "1",
                    "mappa_territori.jpg",
                    "https://images.unsplash.com/photo-1507003211169-0a1dd7228f2d?w=400",
                )],
                vec![link(
                    "1",
                    "Portale Procedure Operative",
                    "https://www.example.com/procedure",
                    "Accesso alle procedure complete",
                )],
            ),
        },
        NewsItem {
            entry: Sample {
                id: "2",
                title: "Corso di Aggiornamento Codice della Strada",
                content: "È programmato per il prossimo mese un corso di aggiornamento sul nuovo \
                          Codice della Strada. Le iscrizioni sono aperte fino al 31 gennaio.",
                category: "Formazione",
                author: "Ufficio Formazione",
                priority: Priority::Medium,
                tags: &["formazione", "codice strada", "corso"],
                date: day(2024, 1, 18),
            }
            .into_entry(
                vec![attachment("2", "programma_corso.pdf", "845 KB")],
                Vec::new(),
                vec![link(
                    "2",
                    "Iscrizioni Online",
                    "https://www.example.com/iscrizioni",
                    "Modulo per le iscrizioni al corso",
                )],
            ),
        },
    ]
}
