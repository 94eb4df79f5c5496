use crate::session::scheduler::ReplyTicket;
use crate::session::PageId;

#[derive(Debug, Clone)]
pub enum AppEvent {
    ReplyDue(ReplyTicket),
    PageChangeRequested(PageId),
}
