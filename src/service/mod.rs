use crate::{
    dto::{CreateNoteRequest, NoteResponse, Pagination, UpdateNoteRequest},
    repository::Repository,
};

/// Runs each operation in its own session. Early returns drop the session,
/// which rolls it back.
#[derive(Clone)]
pub struct NoteService {
    repo: Repository,
}

impl NoteService {
    pub const fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn create_note(&self, request: CreateNoteRequest) -> Result<NoteResponse, sqlx::Error> {
        let mut session = self.repo.write_session().await?;
        let note = session.create_note(request.title, request.content).await?;
        session.commit().await?;

        tracing::debug!(id = note.id, "note created");

        Ok(note.into())
    }

    pub async fn update_note(
        &self,
        id: i64,
        request: UpdateNoteRequest,
    ) -> Result<Option<NoteResponse>, sqlx::Error> {
        let mut session = self.repo.write_session().await?;
        let Some(existing) = session.get_note(id).await? else {
            return Ok(None);
        };
        let note = session
            .update_note(existing, request.title, request.content)
            .await?;
        session.commit().await?;

        Ok(Some(note.into()))
    }

    /// `Ok(false)` when there was nothing to delete, including when a
    /// concurrent request removed the note first.
    pub async fn delete_note(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut session = self.repo.write_session().await?;
        let Some(existing) = session.get_note(id).await? else {
            return Ok(false);
        };
        let deleted = session.delete_note(&existing).await?;
        session.commit().await?;

        if deleted {
            tracing::debug!(id, "note deleted");
        }

        Ok(deleted)
    }

    pub async fn get_one_note(&self, id: i64) -> Result<Option<NoteResponse>, sqlx::Error> {
        let mut session = self.repo.session().await?;
        let note = session.get_note(id).await?;
        session.commit().await?;

        Ok(note.map(NoteResponse::from))
    }

    pub async fn get_all_notes(&self, page: Pagination) -> Result<Vec<NoteResponse>, sqlx::Error> {
        let mut session = self.repo.session().await?;
        let notes = session.list_notes(page.skip, page.limit).await?;
        session.commit().await?;

        Ok(notes.into_iter().map(NoteResponse::from).collect())
    }
}
